//! Localized user-facing error messages.

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    ChatSessionNotFound,
    UserNotFound,
    UnauthorizedAccess,
    InvalidCredentials,
}

fn translations(key: ErrorKey) -> &'static [(&'static str, &'static str)] {
    match key {
        ErrorKey::ChatSessionNotFound => &[
            ("English", "Chat session not found or doesn't belong to user"),
            ("Spanish", "Sesión de chat no encontrada o no pertenece al usuario"),
            ("French", "Session de chat introuvable ou n'appartient pas à l'utilisateur"),
        ],
        ErrorKey::UserNotFound => &[
            ("English", "User not found"),
            ("Spanish", "Usuario no encontrado"),
            ("French", "Utilisateur non trouvé"),
        ],
        ErrorKey::UnauthorizedAccess => &[
            ("English", "Unauthorized access"),
            ("Spanish", "Acceso no autorizado"),
            ("French", "Accès non autorisé"),
        ],
        ErrorKey::InvalidCredentials => &[
            ("English", "Invalid username or password"),
            ("Spanish", "Nombre de usuario o contraseña inválidos"),
            ("French", "Nom d'utilisateur ou mot de passe invalide"),
        ],
    }
}

/// Message for `key` in `language`, falling back to English.
pub fn message(key: ErrorKey, language: &str) -> &'static str {
    let table = translations(key);
    table
        .iter()
        .find(|(lang, _)| lang.eq_ignore_ascii_case(language.trim()))
        .or_else(|| table.iter().find(|(lang, _)| *lang == DEFAULT_LANGUAGE))
        .map(|(_, text)| *text)
        .unwrap_or("Unknown error")
}
