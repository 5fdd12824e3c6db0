use crate::render::backend::LoadError;

/// Status code returned to C hosts on success.
pub const STATUS_SUCCESS: i32 = 0;

const ENOENT: i32 = 2;
const EIO: i32 = 5;
const ENOMEM: i32 = 12;
const EFAULT: i32 = 14;
const EINVAL: i32 = 22;
const ENOSYS: i32 = 38;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("No such object: {0}")]
    NotExist(String),

    #[error("Invalid argument: {0}")]
    Invalid(String),

    #[error("Toolkit fault: {0}")]
    Fault(String),

    #[error("Failed to load resource: {0}")]
    Io(String),

    #[error("Out of memory")]
    Memory,

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl ScriptError {
    /// Negative errno-style status understood by the widget host.
    pub fn status(&self) -> i32 {
        match self {
            ScriptError::NotExist(_) => -ENOENT,
            ScriptError::Invalid(_) => -EINVAL,
            ScriptError::Fault(_) => -EFAULT,
            ScriptError::Io(_) => -EIO,
            ScriptError::Memory => -ENOMEM,
            ScriptError::NotImplemented(_) => -ENOSYS,
        }
    }
}

impl From<LoadError> for ScriptError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Construction => ScriptError::Fault(err.to_string()),
            LoadError::OutOfMemory => ScriptError::Memory,
            other => ScriptError::Io(other.to_string()),
        }
    }
}

/// Folds a verb result into the status code handed back over the C boundary.
pub fn status_of<T>(result: &Result<T, ScriptError>) -> i32 {
    match result {
        Ok(_) => STATUS_SUCCESS,
        Err(e) => e.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_map_onto_the_taxonomy() {
        assert!(matches!(ScriptError::from(LoadError::Construction), ScriptError::Fault(_)));
        assert!(matches!(ScriptError::from(LoadError::OutOfMemory), ScriptError::Memory));
        assert!(matches!(ScriptError::from(LoadError::NotFound("a.edj".into())), ScriptError::Io(_)));
        assert!(matches!(
            ScriptError::from(LoadError::Backend(anyhow::anyhow!("decoder crashed"))),
            ScriptError::Io(_)
        ));
    }

    #[test]
    fn status_codes_are_negative_errno_values() {
        let ok: Result<(), ScriptError> = Ok(());
        assert_eq!(status_of(&ok), STATUS_SUCCESS);
        assert_eq!(ScriptError::NotExist("title".into()).status(), -2);
        assert_eq!(ScriptError::Invalid("rgba".into()).status(), -22);
        assert_eq!(ScriptError::NotImplemented("key".into()).status(), -38);
    }
}
