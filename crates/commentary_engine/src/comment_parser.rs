/* 📖 # How comments are found

The scanner walks a file line by line and carries a `ScanState` from one line
to the next: either we are outside any block comment, or inside one and
waiting for its end token. Within a line a cursor moves left to right:

- inside a block, look for the end token; emit everything up to it (or the
  rest of the line when the block continues)
- outside, find the earliest line-comment token or block start token. A line
  comment takes the rest of the line. A block start moves the cursor past the
  token and the line continues in block mode.

Ties go to the line comment. Between two block starts at the same index the
longer token wins, so the C doc opener beats the plain one. The exception is a
shorter block that already closes inside the longer opener: an empty C block
is a plain empty comment, not the start of a doc block.

Every emitted fragment is cleaned (leading `*` decoration stripped, trimmed),
empty fragments are dropped and the rest are categorised and filtered.
Nothing in here can fail: any text with any grammar produces a hit list.
*/

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::hit::{Category, CommentFilter, CommentHit};
use crate::syntax::{BlockComment, CommentSyntax};

static LEADING_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*+\s*").expect("leading star pattern is valid"));

/// Scanner state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState<'s> {
    NotInBlock,
    InBlock { end: &'s str, is_doc: bool },
}

/// Uncleaned comment text found on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawFragment<'a> {
    text: &'a str,
    is_doc: bool,
}

#[derive(Debug, Clone, Copy)]
enum Token<'s> {
    Line { offset: usize },
    BlockStart { offset: usize, block: &'s BlockComment },
}

/// Extract the comments of one file.
///
/// `file_name` is only copied into the hits. Hits come back in source order.
pub fn extract(
    content: &str,
    file_name: &str,
    syntax: &CommentSyntax,
    filter: CommentFilter,
) -> Vec<CommentHit> {
    let content = normalize_newlines(content);
    let mut hits = Vec::new();
    let mut fragments = Vec::new();

    content
        .split('\n')
        .enumerate()
        .fold(ScanState::NotInBlock, |state, (index, line)| {
            fragments.clear();
            let next = scan_line(line, syntax, state, &mut fragments);
            for fragment in &fragments {
                let text = clean_fragment(fragment.text);
                if text.is_empty() {
                    continue;
                }
                let category = Category::classify(&text, fragment.is_doc);
                if filter.accepts(category) {
                    hits.push(CommentHit {
                        file: file_name.to_string(),
                        line_number: index + 1,
                        text,
                        category,
                    });
                }
            }
            next
        });

    trace!(file = file_name, hits = hits.len(), "extracted comments");
    hits
}

/// Strip decorative leading stars and surrounding whitespace.
pub fn clean_fragment(raw: &str) -> String {
    LEADING_STARS.replace(raw, "").trim().to_string()
}

fn normalize_newlines(content: &str) -> Cow<'_, str> {
    if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

fn scan_line<'a, 's>(
    line: &'a str,
    syntax: &'s CommentSyntax,
    mut state: ScanState<'s>,
    fragments: &mut Vec<RawFragment<'a>>,
) -> ScanState<'s> {
    let mut cursor = 0;
    loop {
        match state {
            ScanState::InBlock { end, is_doc } => match line[cursor..].find(end) {
                Some(offset) => {
                    fragments.push(RawFragment {
                        text: &line[cursor..cursor + offset],
                        is_doc,
                    });
                    cursor += offset + end.len();
                    state = ScanState::NotInBlock;
                }
                None => {
                    fragments.push(RawFragment {
                        text: &line[cursor..],
                        is_doc,
                    });
                    return state;
                }
            },
            ScanState::NotInBlock => match next_token(&line[cursor..], syntax) {
                None => return state,
                Some(Token::Line { offset }) => {
                    fragments.push(line_comment_fragment(&line[cursor + offset..], syntax));
                    return state;
                }
                Some(Token::BlockStart { offset, block }) => {
                    cursor += offset + block.start.len();
                    state = ScanState::InBlock {
                        end: &block.end,
                        is_doc: block.is_doc,
                    };
                }
            },
        }
    }
}

/// Earliest comment opener in `rest`.
fn next_token<'s>(rest: &str, syntax: &'s CommentSyntax) -> Option<Token<'s>> {
    let line = syntax.line_comment().and_then(|token| rest.find(token));
    let block = syntax
        .blocks()
        .iter()
        .filter_map(|block| rest.find(block.start.as_str()))
        .min()
        .and_then(|offset| {
            let opener = &rest[offset..];
            let opens_here = |block: &&BlockComment| opener.starts_with(block.start.as_str());
            syntax
                .blocks()
                .iter()
                .filter(opens_here)
                .filter(|longer| {
                    !syntax
                        .blocks()
                        .iter()
                        .filter(opens_here)
                        .any(|shorter| closes_inside(opener, shorter, longer))
                })
                .min_by(|a, b| b.start.len().cmp(&a.start.len()))
                .map(|block| (offset, block))
        });

    match (line, block) {
        (Some(line_offset), Some((block_offset, block))) if block_offset < line_offset => {
            Some(Token::BlockStart {
                offset: block_offset,
                block,
            })
        }
        (Some(offset), _) => Some(Token::Line { offset }),
        (None, Some((offset, block))) => Some(Token::BlockStart { offset, block }),
        (None, None) => None,
    }
}

/// Whether `shorter` already ends inside the start token of `longer`, as in `/**/`.
/// Both start tokens match at the beginning of `opener`.
fn closes_inside(opener: &str, shorter: &BlockComment, longer: &BlockComment) -> bool {
    let (short_len, long_len) = (shorter.start.len(), longer.start.len());
    short_len < long_len
        && opener[short_len..]
            .find(shorter.end.as_str())
            .is_some_and(|end| end < long_len - short_len)
}

/// `comment` starts at the line-comment token.
fn line_comment_fragment<'a>(comment: &'a str, syntax: &CommentSyntax) -> RawFragment<'a> {
    let doc_prefix = syntax
        .doc_line_prefixes()
        .iter()
        .filter(|prefix| comment.starts_with(prefix.as_str()))
        .max_by_key(|prefix| prefix.len());
    match doc_prefix {
        Some(prefix) => RawFragment {
            text: &comment[prefix.len()..],
            is_doc: true,
        },
        None => {
            let token_len = syntax.line_comment().map_or(0, str::len);
            RawFragment {
                text: &comment[token_len..],
                is_doc: false,
            }
        }
    }
}
