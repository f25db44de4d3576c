/*!
Small hand written matchers for the fixed textual grammars that appear in
the input document: identifiers, hardware pin names and timer/channel names.
*/

/// Maximum length of an identifier which is copied into the generated code.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// `[A-Za-z][A-Za-z0-9_]{0,127}`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => (),
        _ => return false,
    }
    s.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `[a-zA-Z0-9_]{1,128}`, used for board and helper names.
pub fn is_word(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_IDENTIFIER_LEN
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A single uppercase ASCII letter, used for axis and heater names.
pub fn as_id_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

/// `WDTO_[0-9A-Z]{1,10}`, an AVR watchdog timeout constant.
pub fn is_avr_wdto(s: &str) -> bool {
    match s.strip_prefix("WDTO_") {
        Some(rest) => {
            (1..=10).contains(&rest.len())
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        }
        None => false,
    }
}

/// Characters accepted for the channel part of an output compare unit name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharRange(pub char, pub char);

impl CharRange {
    pub fn contains(&self, c: char) -> bool {
        self.0 <= c && c <= self.1
    }
}

/**
The grammar of the timer and channel names of one clock backend, e.g.
`TC([0-9])` and `TC([0-9])([A-C])` for the AT91SAM3X or `FTM([0-9])` and
`FTM([0-9])_([0-9])` for the MK20.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerGrammar {
    pub prefix: &'static str,
    pub separator: Option<char>,
    pub channel: CharRange,
}

impl TimerGrammar {
    /// Matches a timer name and returns its timer id digit.
    pub fn match_timer(&self, name: &str) -> Option<char> {
        let rest = name.strip_prefix(self.prefix)?;
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(d), None) if d.is_ascii_digit() => Some(d),
            _ => None,
        }
    }

    /// Matches an output compare unit name and returns its timer id digit
    /// and channel.
    pub fn match_channel(&self, name: &str) -> Option<(char, char)> {
        let rest = name.strip_prefix(self.prefix)?;
        let mut chars = rest.chars();
        let tc = chars.next().filter(|d| d.is_ascii_digit())?;
        if let Some(sep) = self.separator {
            if chars.next() != Some(sep) {
                return None;
            }
        }
        let channel = chars.next().filter(|c| self.channel.contains(*c))?;
        match chars.next() {
            None => Some((tc, channel)),
            Some(_) => None,
        }
    }
}

/// A grammar which a pin name must match to be accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinPattern {
    /// Any identifier, e.g. a pin alias defined in a board helper header.
    Identifier,

    /// `{pin}<{port}[A-Z],[0-9]{1,3}>`, e.g. `AvrPin<AvrPortA,4>`.
    Port {
        pin: &'static str,
        port: &'static str,
    },
}

impl PinPattern {
    pub fn matches(&self, s: &str) -> bool {
        match self {
            PinPattern::Identifier => is_identifier(s),
            PinPattern::Port { pin, port } => match_port_pin(s, pin, port),
        }
    }
}

fn match_port_pin(s: &str, pin: &str, port: &str) -> bool {
    let inner = match s
        .strip_prefix(pin)
        .and_then(|r| r.strip_prefix('<'))
        .and_then(|r| r.strip_suffix('>'))
        .and_then(|r| r.strip_prefix(port))
    {
        Some(inner) => inner,
        None => return false,
    };

    let mut chars = inner.chars();
    let port_letter_ok = matches!(chars.next(), Some(c) if c.is_ascii_uppercase());
    let comma_ok = chars.next() == Some(',');
    let number: String = chars.collect();
    port_letter_ok
        && comma_ok
        && (1..=3).contains(&number.len())
        && number.chars().all(|c| c.is_ascii_digit())
}
