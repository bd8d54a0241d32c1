//! Session options adjustable with `set <name> <value>`.

use gambit_core::{Color, PromotionPiece};

use crate::error::ShellError;

/// A parsed `set` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOption {
    /// Piece for a last-rank pawn move typed without one; `None` disables.
    Promotion(Option<PromotionPiece>),
    /// Side shown at the bottom of the printed board.
    Orientation(Color),
    /// Preferred locale for opening names.
    Locale(String),
}

impl SessionOption {
    /// Parse an option name and value.
    pub fn parse(name: &str, value: &str) -> Result<SessionOption, ShellError> {
        match name.to_ascii_lowercase().as_str() {
            "promotion" => parse_promotion(value).map(SessionOption::Promotion),
            "orientation" => match value.to_ascii_lowercase().as_str() {
                "white" | "w" => Ok(SessionOption::Orientation(Color::White)),
                "black" | "b" => Ok(SessionOption::Orientation(Color::Black)),
                _ => Err(ShellError::InvalidOptionValue {
                    name: "orientation",
                    value: value.to_string(),
                }),
            },
            "locale" if !value.is_empty() => Ok(SessionOption::Locale(value.to_ascii_lowercase())),
            "locale" => Err(ShellError::InvalidOptionValue {
                name: "locale",
                value: value.to_string(),
            }),
            _ => Err(ShellError::UnknownOption {
                name: name.to_string(),
            }),
        }
    }
}

fn parse_promotion(value: &str) -> Result<Option<PromotionPiece>, ShellError> {
    let invalid = || ShellError::InvalidOptionValue {
        name: "promotion",
        value: value.to_string(),
    };
    match value.to_ascii_lowercase().as_str() {
        "none" | "off" => Ok(None),
        "queen" => Ok(Some(PromotionPiece::Queen)),
        "rook" => Ok(Some(PromotionPiece::Rook)),
        "bishop" => Ok(Some(PromotionPiece::Bishop)),
        "knight" => Ok(Some(PromotionPiece::Knight)),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => PromotionPiece::from_char(c).map(Some).ok_or_else(invalid),
                _ => Err(invalid()),
            }
        }
    }
}

/// Configuration knobs for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Default promotion piece.
    pub promotion: Option<PromotionPiece>,
    /// Board orientation.
    pub orientation: Color,
    /// Opening-name locale; English names are the fallback.
    pub locale: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            promotion: Some(PromotionPiece::Queen),
            orientation: Color::White,
            locale: "en".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn apply(&mut self, option: SessionOption) {
        match option {
            SessionOption::Promotion(piece) => self.promotion = piece,
            SessionOption::Orientation(color) => self.orientation = color,
            SessionOption::Locale(locale) => self.locale = locale,
        }
    }
}

#[cfg(test)]
mod tests {
    use gambit_core::{Color, PromotionPiece};

    use super::{SessionConfig, SessionOption};
    use crate::error::ShellError;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.promotion, Some(PromotionPiece::Queen));
        assert_eq!(config.orientation, Color::White);
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn parse_promotion_values() {
        assert_eq!(
            SessionOption::parse("promotion", "n").unwrap(),
            SessionOption::Promotion(Some(PromotionPiece::Knight))
        );
        assert_eq!(
            SessionOption::parse("Promotion", "Rook").unwrap(),
            SessionOption::Promotion(Some(PromotionPiece::Rook))
        );
        assert_eq!(
            SessionOption::parse("promotion", "none").unwrap(),
            SessionOption::Promotion(None)
        );
        assert!(matches!(
            SessionOption::parse("promotion", "king"),
            Err(ShellError::InvalidOptionValue { name: "promotion", .. })
        ));
    }

    #[test]
    fn apply_options() {
        let mut config = SessionConfig::default();
        config.apply(SessionOption::parse("orientation", "black").unwrap());
        config.apply(SessionOption::parse("locale", "KO").unwrap());
        config.apply(SessionOption::Promotion(None));
        assert_eq!(config.orientation, Color::Black);
        assert_eq!(config.locale, "ko");
        assert_eq!(config.promotion, None);
    }

    #[test]
    fn unknown_option() {
        assert!(matches!(
            SessionOption::parse("hash", "16"),
            Err(ShellError::UnknownOption { .. })
        ));
    }
}
