use crate::{dataset::InputSnapshot, error::RelayError};

/// Read access to the inputs of a form.
pub trait FormScope {
    type File;

    fn inputs_named(&self, name: &str) -> Vec<InputSnapshot<Self::File>>;
}

/// A form submission event.
pub trait Submission {
    type Form: FormScope;

    fn prevent_default(&self);

    fn form(&self) -> Option<Self::Form>;
}

impl FormScope for web_sys::HtmlFormElement {
    type File = web_sys::File;

    fn inputs_named(&self, name: &str) -> Vec<InputSnapshot<Self::File>> {
        use wasm_bindgen::JsCast as _;

        let selector = format!("input[name=\"{}\"]", css_string(name));

        let nodes = match self.query_selector_all(&selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                gloo::console::error!(format!(
                    "Could not query '{selector}' due to: {}",
                    crate::error::js_error(&e)
                ));
                return Vec::new();
            }
        };

        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<web_sys::HtmlInputElement>().ok())
            .map(|input| InputSnapshot {
                input_type: input.type_(),
                files: input.files().map(file_list).unwrap_or_default(),
            })
            .collect()
    }
}

impl Submission for web_sys::Event {
    type Form = web_sys::HtmlFormElement;

    fn prevent_default(&self) {
        web_sys::Event::prevent_default(self)
    }

    fn form(&self) -> Option<Self::Form> {
        use wasm_bindgen::JsCast as _;

        self.target()?.dyn_into::<web_sys::HtmlFormElement>().ok()
    }
}

/// Every form matching `selector`, in DOM order.
pub fn forms(
    document: &web_sys::Document,
    selector: &str,
) -> Result<Vec<web_sys::HtmlFormElement>, RelayError> {
    use wasm_bindgen::JsCast as _;

    let nodes = document
        .query_selector_all(selector)
        .map_err(|e| RelayError::Dom {
            why: crate::error::js_error(&e),
        })?;

    Ok((0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<web_sys::HtmlFormElement>().ok())
        .collect())
}

fn file_list(list: web_sys::FileList) -> Vec<web_sys::File> {
    (0..list.length()).filter_map(|index| list.get(index)).collect()
}

/// Escapes a value so it can sit between double quotes in a CSS selector.
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}
