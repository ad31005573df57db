//! Renders the grouping tree as an indented listing.
//!
//! Used for dry runs and verbose runs. The output mirrors `tree`-style
//! listings: the root path on its own line, then one line per node with a
//! branch glyph that closes the chain for the last sibling.

use crate::dates::display_name;
use crate::node::{Node, NodeVisitor};
use std::io::{self, Write};

/// Glyph for a sibling with further siblings after it.
pub const BRANCH_INNER: &str = "├──";
/// Glyph for the last (or only) sibling in its chain.
pub const BRANCH_LAST: &str = "└──";

const INDENT_UNIT: &str = "   ";

/// Prints each visited node, indented by depth.
pub struct PrintingVisitor<W: Write> {
    out: W,
    expand_month: bool,
}

impl PrintingVisitor<io::Stdout> {
    /// A printing visitor that writes to standard output.
    pub fn stdout(expand_month: bool) -> Self {
        Self::new(io::stdout(), expand_month)
    }
}

impl<W: Write> PrintingVisitor<W> {
    pub fn new(out: W, expand_month: bool) -> Self {
        Self { out, expand_month }
    }

    /// Consumes the visitor, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NodeVisitor for PrintingVisitor<W> {
    fn visit(&mut self, node: &Node, depth: usize, is_last: bool) {
        if depth == 0 {
            let _ = writeln!(self.out, "{}", node.name);
            return;
        }

        if depth >= 2 {
            for _ in 0..depth - 1 {
                let _ = write!(self.out, "{}", INDENT_UNIT);
            }
        }

        let prefix = if is_last { BRANCH_LAST } else { BRANCH_INNER };
        let name = display_name(&node.name, depth, self.expand_month);
        let _ = writeln!(self.out, "{} {}", prefix, name);
    }
}
