#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span { pub start: u32, pub end: u32 }
impl Span { pub fn new(start: usize, end: usize) -> Self { Self { start: start as u32, end: end as u32 } } }


#[derive(Debug, Clone, PartialEq)]
pub struct CloveError(pub String);
impl std::fmt::Display for CloveError { fn fmt(&self, f:&mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) } }
impl std::error::Error for CloveError {}


pub type Result<T> = std::result::Result<T, CloveError>;
