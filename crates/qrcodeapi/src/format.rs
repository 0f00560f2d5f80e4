use core::fmt;

/// Image container formats the renderer can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
    /// Lossless WebP.
    WebP,
    Svg,
}

impl OutputFormat {
    pub const ALL: [Self; 5] = [Self::Png, Self::Jpeg, Self::Gif, Self::WebP, Self::Svg];

    /// The canonical MIME type written into responses.
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Looks up a format by MIME type. Case and parameters (`;q=0.8`) are
    /// ignored and `image/jpg` is accepted as an alias of `image/jpeg`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match essence(mime).as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            "image/svg+xml" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Picks the output format for an `Accept`-style list.
    ///
    /// Entries are tried in order and the first supported one wins. Wildcards
    /// resolve to PNG, as does a list with no supported entry at all.
    pub fn negotiate(accept: &str) -> Self {
        accept
            .split(',')
            .find_map(|entry| match essence(entry).as_str() {
                "image/*" | "*/*" => Some(Self::Png),
                _ => Self::from_mime(entry),
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mime_ignores_case_and_parameters() {
        assert_eq!(OutputFormat::from_mime("IMAGE/PNG"), Some(OutputFormat::Png));
        assert_eq!(
            OutputFormat::from_mime(" image/webp ; q=0.9"),
            Some(OutputFormat::WebP)
        );
        assert_eq!(OutputFormat::from_mime("image/jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_mime("image/bmp"), None);
        assert_eq!(OutputFormat::from_mime(""), None);
    }

    #[test]
    fn negotiate_takes_first_supported_entry() {
        assert_eq!(
            OutputFormat::negotiate("image/avif, image/gif, image/png"),
            OutputFormat::Gif
        );
        assert_eq!(OutputFormat::negotiate("image/jpeg"), OutputFormat::Jpeg);
    }

    #[test]
    fn negotiate_falls_back_to_png() {
        assert_eq!(OutputFormat::negotiate(""), OutputFormat::Png);
        assert_eq!(OutputFormat::negotiate("text/html"), OutputFormat::Png);
        assert_eq!(OutputFormat::negotiate("*/*"), OutputFormat::Png);
        assert_eq!(
            OutputFormat::negotiate("image/*, image/gif"),
            OutputFormat::Png
        );
    }

    #[test]
    fn mime_round_trips_for_every_format() {
        for format in OutputFormat::ALL {
            assert_eq!(OutputFormat::from_mime(format.mime()), Some(format));
        }
    }
}
