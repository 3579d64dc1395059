use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::TrueColor { r: 110, g: 110, b: 110 };
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 192, g: 192, b: 192 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 130, g: 230, b: 130 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 80, g: 160, b: 80 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 230, g: 160, b: 230 };
pub const VENDOR: Color = Color::TrueColor { r: 240, g: 220, b: 130 };
pub const HOSTNAME: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const NO_DATA: Color = Color::TrueColor { r: 90, g: 90, b: 90 };
