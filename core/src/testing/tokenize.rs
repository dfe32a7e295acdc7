pub type Result = std::result::Result<Vec<String>, TokenizeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("Unterminated quote {0} (opened at {})", .1+1)]
    UnterminatedQuote(char, usize),

    #[error("Command must not be blank")]
    BlankCommand,
}

/// Splits a shell-like command line into argv without invoking a shell.
///
/// - Whitespace outside quotes separates tokens.
/// - `"..."` and `'...'` keep inner whitespace; the quotes themselves are dropped.
/// - A backslash escapes the next char, except inside single quotes.
/// - A trailing lone backslash is kept literally.
pub fn tokenize(cmd: &str) -> Result {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum State {
        Normal,
        Quoted(char),
    }
    use State::*;

    let mut state = Normal;
    let mut escaping = false;
    let mut pos_open_quote = 0;
    let mut tokens = Vec::new();
    let mut cur = String::new();

    for (i, c) in cmd.chars().enumerate() {
        if escaping {
            cur.push(c);
            escaping = false;
            continue;
        }
        match (c, state) {
            ('\\', Quoted('\'')) => cur.push(c),
            ('\\', _) => escaping = true,
            (c, Quoted(q)) if c == q => state = Normal,
            (_, Quoted(_)) => cur.push(c),
            ('"' | '\'', Normal) => {
                state = Quoted(c);
                pos_open_quote = i;
            }
            (c, Normal) if c.is_whitespace() => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            (_, Normal) => cur.push(c),
        }
    }

    if escaping {
        cur.push('\\');
    }
    if let Quoted(q) = state {
        return Err(TokenizeError::UnterminatedQuote(q, pos_open_quote));
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    if tokens.is_empty() {
        return Err(TokenizeError::BlankCommand);
    }
    Ok(tokens)
}
