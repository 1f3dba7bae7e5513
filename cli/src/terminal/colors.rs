use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightYellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const HOSTNAME: Color = Color::BrightCyan;
pub const NEW_HOST: Color = Color::BrightMagenta;
pub const TITLE: Color = Color::BrightWhite;

pub const HEALTH_UP: Color = Color::Green;
pub const HEALTH_REDIRECT: Color = Color::Cyan;
pub const HEALTH_WARN: Color = Color::Yellow;
pub const HEALTH_DOWN: Color = Color::Red;
pub const HEALTH_UNKNOWN: Color = Color::BrightBlack;
