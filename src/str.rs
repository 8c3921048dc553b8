//! Character classes from the XML and Namespaces-in-XML grammars.

pub trait XmlChar {
    fn is_ncname_start_char(self) -> bool;
    fn is_ncname_char(self) -> bool;
    fn is_space_char(self) -> bool;
    fn is_decimal_char(self) -> bool;
    fn is_hex_char(self) -> bool;
}

impl XmlChar for char {
    fn is_ncname_start_char(self) -> bool {
        matches!(self,
            'A'..='Z'
            | '_'
            | 'a'..='z'
            | '\u{0000C0}'..='\u{0000D6}'
            | '\u{0000D8}'..='\u{0000F6}'
            | '\u{0000F8}'..='\u{0002FF}'
            | '\u{000370}'..='\u{00037D}'
            | '\u{00037F}'..='\u{001FFF}'
            | '\u{00200C}'..='\u{00200D}'
            | '\u{002070}'..='\u{00218F}'
            | '\u{002C00}'..='\u{002FEF}'
            | '\u{003001}'..='\u{00D7FF}'
            | '\u{00F900}'..='\u{00FDCF}'
            | '\u{00FDF0}'..='\u{00FFFD}'
            | '\u{010000}'..='\u{0EFFFF}')
    }

    fn is_ncname_char(self) -> bool {
        if self.is_ncname_start_char() {
            return true;
        }
        matches!(self,
            '-'
            | '.'
            | '0'..='9'
            | '\u{00B7}'
            | '\u{0300}'..='\u{036F}'
            | '\u{203F}'..='\u{2040}')
    }

    fn is_space_char(self) -> bool {
        matches!(self, '\x20' | '\x09' | '\x0D' | '\x0A')
    }

    fn is_decimal_char(self) -> bool {
        self.is_ascii_digit()
    }

    fn is_hex_char(self) -> bool {
        self.is_ascii_hexdigit()
    }
}

/// A non-colonized name: one NCName start character followed by NCName
/// characters. Element and attribute local names, namespace prefixes, and
/// the halves of a `prefix:local` qualified name must all satisfy this.
pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ncname_start_char() => {}
        _ => return false,
    }
    chars.all(XmlChar::is_ncname_char)
}

#[cfg(test)]
mod test {
    use super::{is_ncname, XmlChar};

    #[test]
    fn ncnames_reject_the_empty_string() {
        assert!(!is_ncname(""));
    }

    #[test]
    fn ncnames_reject_a_leading_digit() {
        assert!(!is_ncname("4wheel"));
    }

    #[test]
    fn ncnames_reject_colons() {
        assert!(!is_ncname("a:b"));
    }

    #[test]
    fn ncnames_accept_interior_digits_and_punctuation() {
        assert!(is_ncname("wheel-4.b_7"));
    }

    #[test]
    fn ncnames_accept_non_ascii_letters() {
        assert!(is_ncname("été"));
    }

    #[test]
    fn space_chars_are_the_xml_four() {
        assert!(' '.is_space_char());
        assert!('\t'.is_space_char());
        assert!('\r'.is_space_char());
        assert!('\n'.is_space_char());
        assert!(!'\u{A0}'.is_space_char());
    }
}
