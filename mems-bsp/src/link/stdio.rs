use tokio::io::{stdin, stdout, Stdin, Stdout};

use super::LineLink;

pub type StdioLink = LineLink<Stdin, Stdout>;

/// Use the process stdin/stdout as the host link
pub fn open_stdio() -> StdioLink {
    LineLink::new(stdin(), stdout(), "stdio")
}
