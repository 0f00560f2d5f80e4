//! Payload selection and well-known QR payload formats.

use core::fmt;

/// Prefix placed in front of URL payloads.
pub const URL_PREFIX: &str = "URLTO:";

/// The text that ends up inside a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Free-form text, encoded verbatim.
    Text(String),
    /// A link, encoded as `URLTO:<url>`.
    Url(String),
}

impl Payload {
    /// Picks the payload for a request. `content` wins when both are set;
    /// `None` when both are empty.
    pub fn select(content: &str, url: &str) -> Option<Self> {
        if !content.is_empty() {
            Some(Self::Text(content.to_owned()))
        } else if !url.is_empty() {
            Some(Self::Url(url.to_owned()))
        } else {
            None
        }
    }

    /// The exact string handed to the encoder.
    pub fn encoded(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Url(url) => format!("{URL_PREFIX}{url}"),
        }
    }
}

/// Wi-Fi authentication types understood by scanners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WifiAuth {
    #[default]
    None,
    Wep,
    Wpa,
    Wpa2,
}

impl WifiAuth {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
            Self::Wpa2 => "WPA2",
        }
    }

    /// Parses `WEP`, `WPA` or `WPA2` (any case). Everything else is an open
    /// network.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "WEP" => Self::Wep,
            "WPA" => Self::Wpa,
            "WPA2" => Self::Wpa2,
            _ => Self::None,
        }
    }
}

impl fmt::Display for WifiAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enterprise (802.1X) options for WPA2 networks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wpa2Enterprise {
    pub eap_method: String,
    pub anonymous_identity: String,
    pub identity: String,
    pub phase2_method: String,
}

/// A network-join payload in the `WIFI:` scheme.
///
/// ```
/// use qrcodeapi::{WifiAuth, WifiNetwork};
///
/// let network = WifiNetwork {
///     ssid: "cafe".into(),
///     auth: WifiAuth::Wpa,
///     password: "p@ss;word".into(),
///     hidden: Some(false),
///     ..Default::default()
/// };
/// assert_eq!(network.to_payload(), r"WIFI:S:cafe;T:WPA;P:p@ss\;word;H:false;;");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WifiNetwork {
    pub ssid: String,
    pub auth: WifiAuth,
    pub password: String,
    /// `None` leaves the `H` field out entirely.
    pub hidden: Option<bool>,
    pub enterprise: Wpa2Enterprise,
}

impl WifiNetwork {
    /// Renders the payload. Empty fields are skipped and the characters
    /// `\ ; , " :` are backslash-escaped inside values.
    pub fn to_payload(&self) -> String {
        let hidden = match self.hidden {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        };
        let fields = [
            ("S", self.ssid.as_str()),
            ("T", self.auth.as_str()),
            ("P", self.password.as_str()),
            ("H", hidden),
            ("E", self.enterprise.eap_method.as_str()),
            ("A", self.enterprise.anonymous_identity.as_str()),
            ("I", self.enterprise.identity.as_str()),
            ("PH2", self.enterprise.phase2_method.as_str()),
        ];

        let body = fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}:{}", escape(value)))
            .collect::<Vec<_>>()
            .join(";");
        format!("WIFI:{body};;")
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | '"' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A postal address, rendered as the seven `ADR` components of vCard 4.0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    /// Second street line, joined to `street` with a line break.
    pub street2: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        [
            &self.street,
            &self.street2,
            &self.city,
            &self.province,
            &self.post_code,
            &self.country,
        ]
        .iter()
        .all(|part| part.is_empty())
    }
}

impl fmt::Display for Address {
    /// Writes `;;street;city;province;post code;country`, or nothing for an
    /// empty address. Post-office box and extended address stay empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let street = if self.street2.is_empty() {
            self.street.clone()
        } else {
            format!("{}\n{}", self.street, self.street2)
        };
        let parts = [
            "",
            "",
            street.as_str(),
            self.city.as_str(),
            self.province.as_str(),
            self.post_code.as_str(),
            self.country.as_str(),
        ];
        f.write_str(&structured(&parts))
    }
}

/// A contact card, rendered as a vCard 4.0 payload.
///
/// Empty fields are left out. Lines end with CRLF.
///
/// ```
/// use qrcodeapi::ContactCard;
///
/// let card = ContactCard {
///     first_name: "Ada".into(),
///     last_name: "Lovelace".into(),
///     mobile: "+44 20 7946 0000".into(),
///     ..Default::default()
/// };
/// assert_eq!(
///     card.to_payload(),
///     "BEGIN:VCARD\r\nVERSION:4.0\r\nN:Lovelace;Ada;;;\r\nFN:Ada Lovelace\r\n\
///      TEL;type=CELL;type=VOICE;type=pref:+44 20 7946 0000\r\nEND:VCARD\r\n"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactCard {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub prefix: String,
    pub suffix: String,
    /// Display name. Built from the name parts when empty.
    pub formatted_name: String,

    pub organization: String,
    pub title: String,

    pub home_email: String,
    pub work_email: String,

    pub mobile: String,
    pub home_tel: String,
    pub work_tel: String,
    pub tel: String,
    pub home_fax: String,
    pub work_fax: String,
    pub pager: String,

    pub home_address: Address,
    pub work_address: Address,

    pub url: String,
    pub note: String,
}

impl ContactCard {
    pub fn to_payload(&self) -> String {
        let name = structured(&[
            self.last_name.as_str(),
            self.first_name.as_str(),
            self.middle_name.as_str(),
            self.prefix.as_str(),
            self.suffix.as_str(),
        ]);
        let formatted = if self.formatted_name.is_empty() {
            [
                &self.prefix,
                &self.first_name,
                &self.middle_name,
                &self.last_name,
                &self.suffix,
            ]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
        } else {
            self.formatted_name.clone()
        };
        let home_address = self.home_address.to_string();
        let work_address = self.work_address.to_string();

        let mut lines = vec![
            "BEGIN:VCARD".to_owned(),
            "VERSION:4.0".to_owned(),
            format!("N:{name}"),
        ];
        let text_fields = [
            ("FN", formatted.as_str()),
            ("ORG", self.organization.as_str()),
            ("TITLE", self.title.as_str()),
            ("EMAIL;type=INTERNET;type=HOME;type=pref", self.home_email.as_str()),
            ("EMAIL;type=INTERNET;type=WORK", self.work_email.as_str()),
            ("TEL;type=CELL;type=VOICE;type=pref", self.mobile.as_str()),
            ("TEL;type=HOME;type=VOICE", self.home_tel.as_str()),
            ("TEL;type=WORK;type=VOICE", self.work_tel.as_str()),
            ("TEL;type=MAIN", self.tel.as_str()),
            ("TEL;type=HOME;type=FAX", self.home_fax.as_str()),
            ("TEL;type=WORK;type=FAX", self.work_fax.as_str()),
            ("TEL;type=PAGER", self.pager.as_str()),
        ];
        lines.extend(
            text_fields
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| format!("{key}:{}", escape_text(value))),
        );
        // Address components are escaped already.
        let addresses = [
            ("ADR;type=HOME;type=pref", home_address.as_str()),
            ("ADR;type=WORK", work_address.as_str()),
        ];
        lines.extend(
            addresses
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| format!("{key}:{value}")),
        );
        let trailing = [("URL", self.url.as_str()), ("NOTE", self.note.as_str())];
        lines.extend(
            trailing
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| format!("{key}:{}", escape_text(value))),
        );
        lines.push("END:VCARD".to_owned());

        let mut out = lines.join("\r\n");
        out.push_str("\r\n");
        out
    }
}

/// Why a raw calendar or contact payload was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("not a vCard: expected BEGIN:VCARD ... END:VCARD")]
    NotAVCard,
}

/// Accepts a complete vCard as-is, apart from line endings.
///
/// The text must start with `BEGIN:VCARD` and end with `END:VCARD` (case
/// insensitive, surrounding whitespace ignored). Every line comes back CRLF
/// terminated.
pub fn vcard_passthrough(raw: &str) -> Result<String, PayloadError> {
    let trimmed = raw.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    let begins = lines
        .first()
        .is_some_and(|line| line.trim_end().eq_ignore_ascii_case("BEGIN:VCARD"));
    let ends = lines
        .last()
        .is_some_and(|line| line.trim_end().eq_ignore_ascii_case("END:VCARD"));
    if lines.len() < 2 || !begins || !ends {
        return Err(PayloadError::NotAVCard);
    }
    let mut card = normalize_line_endings(trimmed);
    card.push_str("\r\n");
    Ok(card)
}

/// Turns bare `\n` line breaks of an iCalendar event into `\r\n`. Existing
/// CRLF pairs are left alone.
pub fn normalize_vevent(raw: &str) -> String {
    normalize_line_endings(raw)
}

fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for line in text.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) => {
                out.push_str(body.strip_suffix('\r').unwrap_or(body));
                out.push_str("\r\n");
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Joins vCard components with `;`, escaping each one.
fn structured(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| escape_text(part))
        .collect::<Vec<_>>()
        .join(";")
}

/// vCard text value escaping: backslash, comma, semicolon and newlines.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | ',' | ';' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_wins_over_url() {
        let payload = Payload::select("hello", "https://example.com").unwrap();
        assert_eq!(payload, Payload::Text("hello".into()));
        assert_eq!(payload.encoded(), "hello");
    }

    #[test]
    fn url_payload_is_prefixed() {
        let payload = Payload::select("", "https://example.com").unwrap();
        assert_eq!(payload.encoded(), "URLTO:https://example.com");
    }

    #[test]
    fn nothing_to_encode() {
        assert_eq!(Payload::select("", ""), None);
    }

    #[test]
    fn open_network_skips_empty_fields() {
        let network = WifiNetwork {
            ssid: "guest".into(),
            ..Default::default()
        };
        assert_eq!(network.to_payload(), "WIFI:S:guest;;");
    }

    #[test]
    fn enterprise_fields_are_ordered_and_escaped() {
        let network = WifiNetwork {
            ssid: r#"corp"net"#.into(),
            auth: WifiAuth::Wpa2,
            password: r"a\b".into(),
            hidden: Some(true),
            enterprise: Wpa2Enterprise {
                eap_method: "PEAP".into(),
                anonymous_identity: "anon".into(),
                identity: "user,1".into(),
                phase2_method: "MSCHAPV2".into(),
            },
        };
        assert_eq!(
            network.to_payload(),
            r#"WIFI:S:corp\"net;T:WPA2;P:a\\b;H:true;E:PEAP;A:anon;I:user\,1;PH2:MSCHAPV2;;"#
        );
    }

    #[test]
    fn auth_parsing_defaults_to_open() {
        assert_eq!(WifiAuth::parse("wpa2"), WifiAuth::Wpa2);
        assert_eq!(WifiAuth::parse("WEP"), WifiAuth::Wep);
        assert_eq!(WifiAuth::parse("nopass"), WifiAuth::None);
    }

    #[test]
    fn contact_card_orders_fields_and_skips_empty_ones() {
        let card = ContactCard {
            last_name: "Hopper".into(),
            first_name: "Grace".into(),
            prefix: "RADM".into(),
            organization: "US Navy".into(),
            work_email: "grace@example.com".into(),
            tel: "555-0100".into(),
            pager: "555-0199".into(),
            work_address: Address {
                street: "1 Main St".into(),
                street2: "Suite 2".into(),
                city: "Arlington".into(),
                province: "VA".into(),
                post_code: "22201".into(),
                country: "USA".into(),
            },
            note: "COBOL, compilers".into(),
            ..Default::default()
        };
        assert_eq!(
            card.to_payload(),
            "BEGIN:VCARD\r\n\
             VERSION:4.0\r\n\
             N:Hopper;Grace;;RADM;\r\n\
             FN:RADM Grace Hopper\r\n\
             ORG:US Navy\r\n\
             EMAIL;type=INTERNET;type=WORK:grace@example.com\r\n\
             TEL;type=MAIN:555-0100\r\n\
             TEL;type=PAGER:555-0199\r\n\
             ADR;type=WORK:;;1 Main St\\nSuite 2;Arlington;VA;22201;USA\r\n\
             NOTE:COBOL\\, compilers\r\n\
             END:VCARD\r\n"
        );
    }

    #[test]
    fn explicit_formatted_name_wins() {
        let card = ContactCard {
            first_name: "Grace".into(),
            formatted_name: "Amazing Grace".into(),
            ..Default::default()
        };
        assert!(card.to_payload().contains("\r\nFN:Amazing Grace\r\n"));
    }

    #[test]
    fn name_components_are_escaped() {
        let card = ContactCard {
            last_name: "Doe; Jr".into(),
            first_name: r"J\D".into(),
            ..Default::default()
        };
        assert!(card.to_payload().contains(r"N:Doe\; Jr;J\\D;;;"));
    }

    #[test]
    fn empty_address_renders_nothing() {
        assert!(Address::default().is_empty());
        assert_eq!(Address::default().to_string(), "");

        let card = ContactCard {
            first_name: "Nobody".into(),
            home_address: Address::default(),
            ..Default::default()
        };
        assert!(!card.to_payload().contains("ADR"));
    }

    #[test]
    fn address_without_second_line() {
        let address = Address {
            street: "10 Downing St".into(),
            city: "London".into(),
            country: "UK".into(),
            ..Default::default()
        };
        assert_eq!(address.to_string(), ";;10 Downing St;London;;;UK");
    }

    #[test]
    fn vcard_passthrough_normalizes_line_endings() {
        let raw = "  BEGIN:VCARD\nVERSION:4.0\r\nFN:Ada\nEND:VCARD\n\n";
        assert_eq!(
            vcard_passthrough(raw).unwrap(),
            "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Ada\r\nEND:VCARD\r\n"
        );
        assert_eq!(
            vcard_passthrough("begin:vcard\nend:vcard").unwrap(),
            "begin:vcard\r\nend:vcard\r\n"
        );
    }

    #[test]
    fn vcard_passthrough_rejects_other_text() {
        assert_eq!(vcard_passthrough(""), Err(PayloadError::NotAVCard));
        assert_eq!(
            vcard_passthrough("BEGIN:VCARD"),
            Err(PayloadError::NotAVCard)
        );
        assert_eq!(
            vcard_passthrough("BEGIN:VEVENT\nEND:VEVENT"),
            Err(PayloadError::NotAVCard)
        );
    }

    #[test]
    fn vevent_line_feeds_become_crlf() {
        let raw = "BEGIN:VEVENT\nSUMMARY:Launch\r\nDTSTART:20260101T090000Z\nEND:VEVENT";
        assert_eq!(
            normalize_vevent(raw),
            "BEGIN:VEVENT\r\nSUMMARY:Launch\r\nDTSTART:20260101T090000Z\r\nEND:VEVENT"
        );
        assert_eq!(normalize_vevent("a\n\nb\n"), "a\r\n\r\nb\r\n");
    }
}
