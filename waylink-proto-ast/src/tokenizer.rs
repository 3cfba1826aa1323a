//! A minimal streaming XML tokenizer, just enough of the grammar Wayland protocol
//! files actually use: elements, attributes, text, comments and processing
//! instructions. No DTDs, no namespaces, no CDATA.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag(&'a str),
    EmptyTag(&'a str),
    EndTag(&'a str),
    Attribute(&'a str, String),
    Text(&'a str),
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("{0}: unexpected end of file")]
    UnexpectedEof(Pos),
    #[error("{0}: unexpected character {1:?}")]
    UnexpectedChar(Pos, char),
    #[error("{0}: unterminated tag")]
    OpenTag(Pos),
    #[error("{0}: unterminated comment")]
    OpenComment(Pos),
    #[error("{0}: unterminated processing instruction")]
    OpenProcInst(Pos),
    #[error("{0}: unterminated attribute value")]
    OpenValue(Pos),
}

impl TokenizeError {
    pub fn pos(&self) -> Pos {
        match *self {
            Self::UnexpectedEof(p)
            | Self::UnexpectedChar(p, _)
            | Self::OpenTag(p)
            | Self::OpenComment(p)
            | Self::OpenProcInst(p)
            | Self::OpenValue(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Between tags, looking for the next `<` or text run.
    Text,
    /// Inside `<name ...`, looking for attributes or the tag close.
    Tag,
}

pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    mode: Mode,
    /// Set once a `<name` has been consumed and we're scanning its attributes.
    pending_tag_name: Option<&'a str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
            mode: Mode::Text,
            pending_tag_name: None,
        }
    }

    pub fn current_pos(&self) -> Pos {
        Pos { line: self.line, column: self.col }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.src[self.pos..].starts_with(needle)
    }

    fn skip_comment(&mut self) -> Result<(), TokenizeError> {
        let start = self.current_pos();
        debug_assert!(self.starts_with("<!--"));
        self.pos += 4;
        self.col += 4;
        loop {
            if self.starts_with("-->") {
                self.pos += 3;
                self.col += 3;
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(TokenizeError::OpenComment(start));
            }
        }
    }

    fn skip_proc_inst(&mut self) -> Result<(), TokenizeError> {
        let start = self.current_pos();
        debug_assert!(self.starts_with("<?"));
        self.pos += 2;
        self.col += 2;
        loop {
            if self.starts_with("?>") {
                self.pos += 2;
                self.col += 2;
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(TokenizeError::OpenProcInst(start));
            }
        }
    }

    fn is_name_start(c: char) -> bool {
        c == ':' || c == '_' || c.is_ascii_alphabetic()
    }

    fn is_name_cont(c: char) -> bool {
        Self::is_name_start(c) || c == '-' || c == '.' || c.is_ascii_digit()
    }

    fn scan_name(&mut self) -> Result<&'a str, TokenizeError> {
        let start_pos = self.current_pos();
        let start = self.pos;
        match self.peek() {
            Some(c) if Self::is_name_start(c) => {
                self.bump();
            }
            Some(c) => return Err(TokenizeError::UnexpectedChar(start_pos, c)),
            None => return Err(TokenizeError::UnexpectedEof(start_pos)),
        }
        while matches!(self.peek(), Some(c) if Self::is_name_cont(c)) {
            self.bump();
        }
        Ok(&self.src[start..self.pos])
    }

    fn scan_quoted_value(&mut self) -> Result<String, TokenizeError> {
        let start = self.current_pos();
        let quote = match self.bump() {
            Some(c @ ('"' | '\'')) => c,
            Some(c) => return Err(TokenizeError::UnexpectedChar(start, c)),
            None => return Err(TokenizeError::UnexpectedEof(start)),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(unescape_entities(&out)),
                Some(c) => out.push(c),
                None => return Err(TokenizeError::OpenValue(start)),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, TokenizeError> {
        loop {
            match self.mode {
                Mode::Text => {
                    if self.pending_tag_name.take().is_some() {
                        // handled by Tag mode transitions; unreachable in practice
                    }
                    if self.peek().is_none() {
                        return Ok(Token::Eof);
                    }
                    if self.starts_with("<!--") {
                        self.skip_comment()?;
                        continue;
                    }
                    if self.starts_with("<?") {
                        self.skip_proc_inst()?;
                        continue;
                    }
                    if self.starts_with("</") {
                        let start = self.current_pos();
                        self.pos += 2;
                        self.col += 2;
                        let name = self.scan_name()?;
                        self.skip_ws();
                        match self.bump() {
                            Some('>') => return Ok(Token::EndTag(name)),
                            Some(c) => return Err(TokenizeError::UnexpectedChar(self.current_pos(), c)),
                            None => return Err(TokenizeError::UnexpectedEof(start)),
                        }
                    }
                    if self.peek() == Some('<') {
                        self.bump();
                        let name = self.scan_name()?;
                        self.mode = Mode::Tag;
                        return Ok(Token::StartTag(name));
                    }
                    // Text run up to the next '<'.
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c != '<') {
                        self.bump();
                    }
                    let text = &self.src[start..self.pos];
                    if text.trim().is_empty() {
                        continue;
                    }
                    return Ok(Token::Text(text));
                }
                Mode::Tag => {
                    self.skip_ws();
                    match self.peek() {
                        Some('/') if self.peek_at(1) == Some('>') => {
                            self.bump();
                            self.bump();
                            self.mode = Mode::Text;
                            // Re-synthesize: caller already consumed the StartTag token,
                            // this closes the same element as empty.
                            return Ok(Token::EmptyTag(""));
                        }
                        Some('>') => {
                            self.bump();
                            self.mode = Mode::Text;
                            return Ok(Token::Text(""));
                        }
                        Some(c) if Self::is_name_start(c) => {
                            let name = self.scan_name()?;
                            self.skip_ws();
                            match self.bump() {
                                Some('=') => {}
                                Some(c) => return Err(TokenizeError::UnexpectedChar(self.current_pos(), c)),
                                None => return Err(TokenizeError::UnexpectedEof(self.current_pos())),
                            }
                            self.skip_ws();
                            let value = self.scan_quoted_value()?;
                            return Ok(Token::Attribute(name, value));
                        }
                        Some(c) => return Err(TokenizeError::UnexpectedChar(self.current_pos(), c)),
                        None => return Err(TokenizeError::UnexpectedEof(self.current_pos())),
                    }
                }
            }
        }
    }
}

fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let (replacement, len) = if rest.starts_with("&lt;") {
            ("<", 4)
        } else if rest.starts_with("&gt;") {
            (">", 4)
        } else if rest.starts_with("&amp;") {
            ("&", 5)
        } else if rest.starts_with("&quot;") {
            ("\"", 6)
        } else if rest.starts_with("&apos;") {
            ("'", 6)
        } else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        out.push_str(replacement);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_start_attrs_and_end() {
        let mut t = Tokenizer::new(r#"<a x="1"><b/>text</a>"#);
        assert_eq!(t.next_token().unwrap(), Token::StartTag("a"));
        assert_eq!(t.next_token().unwrap(), Token::Attribute("x", "1".into()));
        assert_eq!(t.next_token().unwrap(), Token::Text(""));
        assert_eq!(t.next_token().unwrap(), Token::StartTag("b"));
        assert_eq!(t.next_token().unwrap(), Token::EmptyTag(""));
        assert_eq!(t.next_token().unwrap(), Token::Text("text"));
        assert_eq!(t.next_token().unwrap(), Token::EndTag("a"));
        assert_eq!(t.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn skips_comments_and_proc_instructions() {
        let mut t = Tokenizer::new("<?xml version=\"1.0\"?><!-- hi --><a></a>");
        assert_eq!(t.next_token().unwrap(), Token::StartTag("a"));
        assert_eq!(t.next_token().unwrap(), Token::Text(""));
        assert_eq!(t.next_token().unwrap(), Token::EndTag("a"));
    }

    #[test]
    fn unescapes_entities_in_attribute_values() {
        let mut t = Tokenizer::new(r#"<a x="Tab &amp; Escape">"#);
        assert_eq!(t.next_token().unwrap(), Token::StartTag("a"));
        assert_eq!(
            t.next_token().unwrap(),
            Token::Attribute("x", "Tab & Escape".into())
        );
    }

    #[test]
    fn reports_line_and_column_on_unterminated_comment() {
        let mut t = Tokenizer::new("<a/>\n<!-- never closed");
        assert_eq!(t.next_token().unwrap(), Token::StartTag("a"));
        assert_eq!(t.next_token().unwrap(), Token::EmptyTag(""));
        let err = t.next_token().unwrap_err();
        assert!(matches!(err, TokenizeError::OpenComment(_)));
        assert_eq!(err.pos().line, 2);
    }
}
