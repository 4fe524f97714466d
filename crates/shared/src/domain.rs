use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ColorParseError, PixelBufferError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DanceId);
id_newtype!(SongId);
id_newtype!(SayingId);

pub const GRID_SIZE: usize = 8;
pub const PIXEL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// One LED colour. Travels over the wire as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const PINK: Rgb = Rgb::new(255, 99, 132);
    pub const MINT: Rgb = Rgb::new(72, 222, 171);
    pub const SKY: Rgb = Rgb::new(56, 189, 248);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Palette name for this colour, if it is one of the five brush colours.
    pub fn palette_name(&self) -> Option<&'static str> {
        PALETTE
            .iter()
            .find(|(_, color)| color == self)
            .map(|(name, _)| *name)
    }
}

/// Brush colours in display order: off, white, pink, mint, sky.
pub const PALETTE: [(&str, Rgb); 5] = [
    ("off", Rgb::OFF),
    ("white", Rgb::WHITE),
    ("pink", Rgb::PINK),
    ("mint", Rgb::MINT),
    ("sky", Rgb::SKY),
];

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.r, value.g, value.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ColorParseError::Empty);
        }

        if let Some(hex) = raw.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::InvalidHex(raw.to_string()));
        }

        if raw.contains(',') {
            let channels = raw
                .split(',')
                .map(|part| part.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ColorParseError::InvalidTriple(raw.to_string()))?;
            let [r, g, b] = channels.as_slice() else {
                return Err(ColorParseError::InvalidTriple(raw.to_string()));
            };
            return Ok(Rgb::new(*r, *g, *b));
        }

        let name = raw.to_ascii_lowercase();
        if name == "black" {
            return Ok(Rgb::OFF);
        }
        PALETTE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, color)| *color)
            .ok_or(ColorParseError::UnknownName(raw.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
    Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// The 8x8 LED grid in row-major order, index 0 top-left and 63 bottom-right.
///
/// The length is fixed; every write goes through a bounds check so that
/// pointer-driven callers can hand over stray indices without panicking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Rgb>")]
pub struct PixelBuffer([Rgb; PIXEL_COUNT]);

impl PixelBuffer {
    pub fn new() -> Self {
        Self([Rgb::OFF; PIXEL_COUNT])
    }

    pub fn filled(color: Rgb) -> Self {
        Self([color; PIXEL_COUNT])
    }

    pub fn index_of(row: usize, col: usize) -> Option<usize> {
        (row < GRID_SIZE && col < GRID_SIZE).then_some(row * GRID_SIZE + col)
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.0.get(index).copied()
    }

    /// Returns whether the cell changed. Out-of-range indices and writes of
    /// the colour already held are no-ops.
    pub fn set(&mut self, index: usize, color: Rgb) -> bool {
        match self.0.get_mut(index) {
            Some(cell) if *cell != color => {
                *cell = color;
                true
            }
            _ => false,
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.0 = [color; PIXEL_COUNT];
    }

    pub fn clear(&mut self) {
        self.fill(Rgb::OFF);
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.0
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.0.chunks(GRID_SIZE)
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for PixelBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl TryFrom<Vec<Rgb>> for PixelBuffer {
    type Error = PixelBufferError;

    fn try_from(pixels: Vec<Rgb>) -> Result<Self, Self::Error> {
        let actual = pixels.len();
        let pixels: [Rgb; PIXEL_COUNT] =
            pixels
                .try_into()
                .map_err(|_| PixelBufferError::WrongLength {
                    expected: PIXEL_COUNT,
                    actual,
                })?;
        Ok(Self(pixels))
    }
}

/// Local speed gauge mirrored next to the speed buttons. The robot never
/// reports its speed, so this only counts presses within the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn increase(&mut self) {
        self.0 = (self.0 + 1).min(Self::MAX);
    }

    pub fn decrease(&mut self) {
        self.0 = self.0.saturating_sub(1).max(Self::MIN);
    }
}

impl Default for SpeedLevel {
    fn default() -> Self {
        Self(5)
    }
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        write!(f, "[{}{}] {}", "|".repeat(filled), ".".repeat(empty), self.0)
    }
}
