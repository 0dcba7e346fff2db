use std::fmt;

/// a 4-bit value, e.g. a register index or a key on the hex keypad. anything
/// wider is masked down on construction, so a `U4` is always a valid index
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U4(u8);

impl U4 {
    /// the flag register, VF
    pub const F: U4 = U4(0xf);

    /// wraps modulo 16
    pub const fn new(value: u8) -> Self {
        U4(value & 0x0f)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// every value from 0 up to and including `self`
    pub fn up_to(self) -> impl Iterator<Item = U4> {
        (0..=self.0).map(U4)
    }
}

impl From<U4> for u8 {
    fn from(n: U4) -> u8 {
        n.0
    }
}

impl fmt::Display for U4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wraps() {
        assert_eq!(U4::new(0x1a).get(), 0x0a);
        assert_eq!(U4::new(0xff), U4::F);
    }

    #[test]
    fn test_up_to_is_inclusive() {
        let all: Vec<u8> = U4::new(3).up_to().map(u8::from).collect();
        assert_eq!(all, vec![0, 1, 2, 3]);
        assert_eq!(U4::F.up_to().count(), 16);
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(U4::new(0xb).to_string(), "B");
    }
}
