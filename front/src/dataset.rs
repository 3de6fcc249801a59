/// One matching input element, as read at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot<F> {
    pub input_type: String,
    pub files: Vec<F>,
}

impl<F> InputSnapshot<F> {
    pub fn file(files: Vec<F>) -> Self {
        Self {
            input_type: String::from("file"),
            files,
        }
    }

    pub fn is_file_input(&self) -> bool {
        self.input_type.eq_ignore_ascii_case("file")
    }
}

/// Printable description of a selected file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

pub trait Describe {
    fn summary(&self) -> FileSummary;
}

impl Describe for web_sys::File {
    fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name(),
            size: self.size() as u64,
            mime: self.type_(),
        }
    }
}

/// Files selected through the dataset inputs of one form, one entry per
/// file input in DOM order.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFileSet<F> {
    entries: Vec<Vec<F>>,
}

impl<F> SelectedFileSet<F> {
    /// Inputs that are not of type `file` are skipped.
    pub fn collect(inputs: impl IntoIterator<Item = InputSnapshot<F>>) -> Self {
        Self {
            entries: inputs
                .into_iter()
                .filter(InputSnapshot::is_file_input)
                .map(|input| input.files)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Vec<F>] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &F> {
        self.entries.iter().flatten()
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().map(Vec::len).sum()
    }

    pub fn into_files(self) -> impl Iterator<Item = F> {
        self.entries.into_iter().flatten()
    }
}

impl<F: Describe> SelectedFileSet<F> {
    pub fn summaries(&self) -> Vec<Vec<FileSummary>> {
        self.entries
            .iter()
            .map(|entry| entry.iter().map(Describe::summary).collect())
            .collect()
    }
}

impl<F> Default for SelectedFileSet<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}
