use chrono::Utc;

pub mod action_log;
pub mod chat;
pub mod crew;
pub mod event;
pub mod events;
pub mod gallery;
pub mod game;
pub mod message;
pub mod user;

pub use action_log::ActionLog;
pub use chat::ChatMessage;
pub use crew::{Crew, CrewGame, CrewStatus, MAX_RESPONSABLES};
pub use event::{Event, EventStatus};
pub use gallery::{GalleryImage, Visibility};
pub use game::{Game, GameStatus};
pub use message::{Message, MessageType};
pub use user::{PushToken, Role, User, UserPreferences};

/// Current UTC time as an RFC 3339 string, the format every record stores.
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

/// Lowercase, ASCII-folded, dash-separated form of a title, used in URLs
/// such as `/crews-modify/:slug` and `/event/:eventName`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.trim().chars() {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => Some('u'),
            'ñ' | 'Ñ' => Some('n'),
            'ç' | 'Ç' => Some('c'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            _ => None,
        };

        match folded {
            Some(c) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            None => pending_dash = true,
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Peña Los Amigos"), "pena-los-amigos");
        assert_eq!(slugify("  Fiesta   de Verano!! 2024 "), "fiesta-de-verano-2024");
        assert_eq!(slugify("Canción"), "cancion");
        assert_eq!(slugify("---"), "");
    }
}
