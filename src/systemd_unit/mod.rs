mod hint;
mod lexer;
mod line_ending;
mod token;
mod tokenizer;

pub use self::hint::*;
pub use self::lexer::*;
pub use self::line_ending::*;
pub use self::token::*;
pub use self::tokenizer::Tokenizer;
