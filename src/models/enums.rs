use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

// Inspection (望诊)

str_enum!(Complexion {
    Pale => "pale",
    Red => "red",
    Yellow => "yellow",
    Dark => "dark",
});

str_enum!(TongueColor {
    Pale => "pale",
    Red => "red",
    Purple => "purple",
    Blue => "blue",
});

str_enum!(TongueCoating {
    Thin => "thin",
    Thick => "thick",
    White => "white",
    Yellow => "yellow",
});

// Auscultation and olfaction (闻诊)

str_enum!(VoiceSound {
    Normal => "normal",
    Hoarse => "hoarse",
    Weak => "weak",
    Loud => "loud",
});

// Inquiry (问诊)

str_enum!(ColdHeatSensation {
    Normal => "normal",
    Chills => "chills",
    Fever => "fever",
    Alternating => "alternating",
});

str_enum!(Appetite {
    Normal => "normal",
    Increased => "increased",
    Decreased => "decreased",
    NoAppetite => "no-appetite",
});

// Palpation (切诊)

str_enum!(PulseQuality {
    Floating => "floating",
    Sinking => "sinking",
    Rapid => "rapid",
    Slow => "slow",
    Wiry => "wiry",
    Slippery => "slippery",
});
