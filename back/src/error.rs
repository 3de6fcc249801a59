#[derive(Debug, thiserror::Error)]
pub enum StaticError {
    #[error("Could not find file '{file}'")]
    NotFound { file: String },

    #[error("Could not read file '{file}' due to: {why}")]
    Read { file: String, why: std::io::Error },
}

impl StaticError {
    pub fn from_io(file: &str, why: std::io::Error) -> Self {
        if why.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                file: file.to_string(),
            }
        } else {
            Self::Read {
                file: file.to_string(),
                why,
            }
        }
    }
}
