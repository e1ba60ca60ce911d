//! Style roles for terminal output
//!
//! Each logical role maps to an optional `colored::Color`. Coloring is applied
//! only when the caller passes `enabled = true`, so there is no global color
//! state to reset between commands or tests.
//!
//! ```
//! use pgq_client::core::styles::StyleRole;
//! assert_eq!(StyleRole::Header.paint("Queues", false), "Queues");
//! assert!(StyleRole::Header.paint("Queues", true).starts_with("\x1b["));
//! ```

use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }
        }
    }
}

style! {
    Header  => Some(Color::Yellow),
    Key     => Some(Color::BrightGreen),
    Value   => None,
    Success => Some(Color::Green),
    Warning => Some(Color::BrightYellow),
    Error   => Some(Color::BrightRed),
    Dim     => Some(Color::BrightBlack),
}

impl StyleRole {
    pub fn ansi_code(self) -> Option<&'static str> {
        ansi_code(self.color()?)
    }

    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.ansi_code() {
            Some(code) if enabled => format!("\x1b[{}m{}\x1b[0m", code, text),
            _ => text.to_string(),
        }
    }

    /// prettytable `style_spec` for this role, e.g. `"Fy"`
    pub fn to_prettytable_spec(self) -> Option<&'static str> {
        Some(match self.color()? {
            Color::Red => "Fr",
            Color::Green => "Fg",
            Color::Yellow => "Fy",
            Color::Blue => "Fb",
            Color::Cyan => "Fc",
            Color::BrightBlack => "FK",
            Color::BrightRed => "FR",
            Color::BrightGreen => "FG",
            Color::BrightYellow => "FY",
            _ => return None,
        })
    }
}

fn ansi_code(color: Color) -> Option<&'static str> {
    use Color::*;
    Some(match color {
        Red => "31",
        Green => "32",
        Yellow => "33",
        Blue => "34",
        Cyan => "36",
        BrightBlack => "90",
        BrightRed => "91",
        BrightGreen => "92",
        BrightYellow => "93",
        _ => return None,
    })
}
