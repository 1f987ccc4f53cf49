use thiserror::Error;

use crate::node::MAX_ARITY;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build a node with {len} arguments, at most {max} are supported")]
    TooManyArguments { len: usize, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid AIGER header: {0}")]
    InvalidHeader(String),

    #[error("AIGER header is inconsistent: M = {max_var}, but I + L + A = {sum}")]
    InconsistentHeader { max_var: u64, sum: u64 },

    #[error("AIGER files with latches are not supported ({0} latches)")]
    UnsupportedLatches(u64),

    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: u64, message: String },
}

impl Error {
    pub(crate) fn too_many_arguments(len: usize) -> Self {
        Error::TooManyArguments {
            len,
            max: MAX_ARITY,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
