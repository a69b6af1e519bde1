//! Culture names and their English display names.
//!
//! A serialized `System.Globalization.CultureInfo` carries its culture name
//! as the first length-prefixed string record of the payload. We only pull
//! that name out; the rest of the object graph is never interpreted.

use std::fmt;

pub const CULTURE_INFO_TYPE: &str = "System.Globalization.CultureInfo";

const INVARIANT_DISPLAY_NAME: &str = "Invariant Language (Invariant Country)";

/// `BinaryObjectString` record tag in a serialized object graph.
const OBJECT_STRING_RECORD: u8 = 0x06;
const MAX_TAG_LEN: usize = 85;

static LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("az", "Azerbaijani"),
    ("be", "Belarusian"),
    ("bg", "Bulgarian"),
    ("bn", "Bangla"),
    ("bs", "Bosnian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fil", "Filipino"),
    ("fr", "French"),
    ("ga", "Irish"),
    ("gl", "Galician"),
    ("gu", "Gujarati"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("hy", "Armenian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ka", "Georgian"),
    ("kk", "Kazakh"),
    ("km", "Khmer"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("mk", "Macedonian"),
    ("ml", "Malayalam"),
    ("mn", "Mongolian"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("mt", "Maltese"),
    ("nb", "Norwegian Bokmål"),
    ("ne", "Nepali"),
    ("nl", "Dutch"),
    ("nn", "Norwegian Nynorsk"),
    ("pa", "Punjabi"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Kiswahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("uz", "Uzbek"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

static SCRIPTS: &[(&str, &str)] = &[
    ("Arab", "Arabic"),
    ("Cyrl", "Cyrillic"),
    ("Hans", "Simplified"),
    ("Hant", "Traditional"),
    ("Latn", "Latin"),
];

static REGIONS: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BA", "Bosnia & Herzegovina"),
    ("BE", "Belgium"),
    ("BG", "Bulgaria"),
    ("BR", "Brazil"),
    ("BY", "Belarus"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EE", "Estonia"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GR", "Greece"),
    ("HK", "Hong Kong SAR"),
    ("HR", "Croatia"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IN", "India"),
    ("IR", "Iran"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KR", "Korea"),
    ("KZ", "Kazakhstan"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("MA", "Morocco"),
    ("MK", "North Macedonia"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PE", "Peru"),
    ("PH", "Philippines"),
    ("PK", "Pakistan"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RS", "Serbia"),
    ("RU", "Russia"),
    ("SA", "Saudi Arabia"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("SI", "Slovenia"),
    ("SK", "Slovakia"),
    ("TH", "Thailand"),
    ("TR", "Türkiye"),
    ("TW", "Taiwan"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("VE", "Venezuela"),
    ("VN", "Vietnam"),
    ("ZA", "South Africa"),
    ("419", "Latin America"),
];

fn lookup(table: &'static [(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// A parsed culture tag: `lang[-Script][-REGION]`, or the invariant culture
/// when all parts are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Culture {
    language: String,
    script: Option<String>,
    region: Option<String>,
}

impl Culture {
    /// Parses a culture tag. Accepts `-` or `_` separators and normalizes
    /// case. The empty string is the invariant culture.
    pub fn new(tag: &str) -> Option<Self> {
        if tag.is_empty() {
            return Some(Self::default());
        }
        if tag.len() > MAX_TAG_LEN {
            return None;
        }
        let mut parts = tag.split(['-', '_']);
        let language = parts.next()?;
        if !(2..=3).contains(&language.len()) || !language.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        let mut culture = Self {
            language: language.to_ascii_lowercase(),
            script: None,
            region: None,
        };

        let mut next = parts.next();
        if let Some(s) = next {
            if s.len() == 4 && s.bytes().all(|b| b.is_ascii_alphabetic()) {
                let mut script = s[..1].to_ascii_uppercase();
                script.push_str(&s[1..].to_ascii_lowercase());
                culture.script = Some(script);
                next = parts.next();
            }
        }
        if let Some(r) = next {
            let alpha = r.len() == 2 && r.bytes().all(|b| b.is_ascii_alphabetic());
            let numeric = r.len() == 3 && r.bytes().all(|b| b.is_ascii_digit());
            if !alpha && !numeric {
                return None;
            }
            culture.region = Some(r.to_ascii_uppercase());
        }
        if parts.next().is_some() {
            return None;
        }
        Some(culture)
    }

    pub fn is_invariant(&self) -> bool {
        self.language.is_empty()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// English display name, e.g. `English (United States)`. Unknown
    /// subtags are shown as their codes.
    pub fn display_name(&self) -> String {
        if self.is_invariant() {
            return INVARIANT_DISPLAY_NAME.to_string();
        }
        let language = lookup(LANGUAGES, &self.language).unwrap_or(self.language.as_str());
        let mut qualifiers = Vec::new();
        if let Some(s) = &self.script {
            qualifiers.push(lookup(SCRIPTS, s).unwrap_or(s.as_str()));
        }
        if let Some(r) = &self.region {
            qualifiers.push(lookup(REGIONS, r).unwrap_or(r.as_str()));
        }
        if qualifiers.is_empty() {
            language.to_string()
        } else {
            format!("{language} ({})", qualifiers.join(", "))
        }
    }

    /// Recovers the culture from a serialized `CultureInfo` payload by
    /// scanning for the first string record that parses as a culture tag.
    pub fn from_serialized(data: &[u8]) -> Option<Self> {
        let mut i = 0;
        while i < data.len() {
            if data[i] == OBJECT_STRING_RECORD {
                if let Some(culture) = object_string_at(&data[i + 1..])
                    .filter(|s| !s.is_empty())
                    .and_then(Culture::new)
                {
                    return Some(culture);
                }
            }
            i += 1;
        }
        None
    }
}

/// Reads `i32 object id` + 7-bit length + UTF-8 bytes.
fn object_string_at(rest: &[u8]) -> Option<&str> {
    let id = i32::from_le_bytes(rest.get(..4)?.try_into().ok()?);
    if id <= 0 {
        return None;
    }
    let rest = &rest[4..];
    let (len, used) = short_7bit_len(rest)?;
    if len > MAX_TAG_LEN {
        return None;
    }
    std::str::from_utf8(rest.get(used..used + len)?).ok()
}

fn short_7bit_len(b: &[u8]) -> Option<(usize, usize)> {
    let first = *b.first()?;
    if first & 0x80 == 0 {
        return Some((first as usize, 1));
    }
    let second = *b.get(1)?;
    if second & 0x80 != 0 {
        return None;
    }
    Some((((second as usize) << 7) | (first & 0x7f) as usize, 2))
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if let Some(s) = &self.script {
            write!(f, "-{s}")?;
        }
        if let Some(r) = &self.region {
            write!(f, "-{r}")?;
        }
        Ok(())
    }
}
