//! Parser for the fixed export document dialect.
//!
//! The export API emits a constrained markup dialect: elements, attributes,
//! character data, CDATA sections, comments and an optional declaration. No
//! namespaces, processing instructions in content, or doctypes. Parsing the
//! dialect directly keeps the ingest path free of anything the schema family
//! never produces; malformed input fails with a byte offset.

use crate::document::{ReportDocument, ReportNode};
use crate::error::ParseError;

/// Parse one export document from response text
pub(crate) fn parse_document(input: &str) -> Result<ReportDocument, ParseError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_bom();
    cursor.skip_misc()?;
    let root = cursor.parse_element()?;
    cursor.skip_misc()?;
    if !cursor.at_end() {
        return Err(cursor.malformed("content after document root"));
    }
    Ok(ReportDocument { root })
}

struct Cursor<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    fn malformed(&self, message: &str) -> ParseError {
        ParseError::Malformed {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(found) if found == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.malformed(&format!(
                "expected '{}', found '{}'",
                byte as char, found as char
            ))),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn skip_bom(&mut self) {
        if self.input.starts_with('\u{feff}') {
            self.pos += '\u{feff}'.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skip whitespace, the optional declaration, and comments
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, terminator: &str) -> Result<(), ParseError> {
        match self.input[self.pos..].find(terminator) {
            Some(offset) => {
                self.pos += offset + terminator.len();
                Ok(())
            }
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(byte) if byte.is_ascii_alphabetic() || byte == b'_' => self.pos += 1,
            Some(_) => return Err(self.malformed("expected a name")),
            None => return Err(ParseError::UnexpectedEof),
        }
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_element(&mut self) -> Result<ReportNode, ParseError> {
        self.expect(b'<')?;
        let tag = self.parse_name()?;
        let mut node = ReportNode::new(tag);

        // Attribute list, then either a self-closing tail or element content
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>')?;
                    return Ok(node);
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let name = self.parse_name()?;
                    self.skip_whitespace();
                    self.expect(b'=')?;
                    self.skip_whitespace();
                    let value = self.parse_quoted_value()?;
                    node.attributes.insert(name.to_string(), value);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        let mut text = String::new();
        let mut text_seen = false;
        loop {
            if self.at_end() {
                return Err(ParseError::UnexpectedEof);
            }
            if self.starts_with("</") {
                self.pos += 2;
                let close_offset = self.pos;
                let close_tag = self.parse_name()?;
                self.skip_whitespace();
                self.expect(b'>')?;
                if close_tag != node.tag {
                    return Err(ParseError::MismatchedTag {
                        offset: close_offset,
                        expected: node.tag.clone(),
                        found: close_tag.to_string(),
                    });
                }
                break;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let start = self.pos;
                self.skip_until("]]>")?;
                text.push_str(&self.input[start..self.pos - "]]>".len()]);
                text_seen = true;
            } else if self.peek() == Some(b'<') {
                node.children.push(self.parse_element()?);
            } else {
                self.parse_text_run(&mut text)?;
                text_seen = true;
            }
        }

        // Character data only counts on leaves; between children it is
        // indentation in this dialect
        if node.children.is_empty() && text_seen {
            node.text = Some(text);
        }
        Ok(node)
    }

    fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(byte @ (b'"' | b'\'')) => byte,
            Some(_) => return Err(self.malformed("expected a quoted attribute value")),
            None => return Err(ParseError::UnexpectedEof),
        };
        self.pos += 1;
        let mut value = String::new();
        loop {
            let start = self.pos;
            while let Some(byte) = self.peek() {
                if byte == quote || byte == b'&' {
                    break;
                }
                self.pos += 1;
            }
            value.push_str(&self.input[start..self.pos]);
            match self.peek() {
                Some(byte) if byte == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(_) => value.push(self.parse_entity()?),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    /// Consume character data up to the next markup or entity boundary
    fn parse_text_run(&mut self, text: &mut String) -> Result<(), ParseError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b'<' || byte == b'&' {
                break;
            }
            self.pos += 1;
        }
        text.push_str(&self.input[start..self.pos]);
        if self.peek() == Some(b'&') {
            text.push(self.parse_entity()?);
        }
        Ok(())
    }

    fn parse_entity(&mut self) -> Result<char, ParseError> {
        let amp_offset = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b';' {
                break;
            }
            self.pos += 1;
        }
        if self.at_end() {
            return Err(ParseError::UnexpectedEof);
        }
        let entity = &self.input[start..self.pos];
        self.pos += 1;
        match entity {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            numeric if numeric.starts_with('#') => {
                let code = if let Some(hex) = numeric
                    .strip_prefix("#x")
                    .or_else(|| numeric.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    numeric[1..].parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| ParseError::UnknownEntity {
                        offset: amp_offset,
                        entity: entity.to_string(),
                    })
            }
            other => Err(ParseError::UnknownEntity {
                offset: amp_offset,
                entity: other.to_string(),
            }),
        }
    }
}
