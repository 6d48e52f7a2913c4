pub const STOP: u8 = 0x00;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const CREATE2: u8 = 0xf5;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// What a byte means to a linear scan that cannot follow jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Valid jump destination: code after it is reachable again.
    JumpDest,
    /// Ends execution of the current frame.
    Halt,
    /// Followed by an immediate literal of the given width.
    Push(usize),
    Other,
}

impl Kind {
    pub const fn of(byte: u8) -> Self {
        match byte {
            JUMPDEST => Kind::JumpDest,
            STOP | RETURN | REVERT | INVALID | SELFDESTRUCT => Kind::Halt,
            PUSH1..=PUSH32 => Kind::Push((byte - PUSH1) as usize + 1),
            _ => Kind::Other,
        }
    }
}

/// Instructions that matter for code replacement at a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    SelfDestruct,
    DelegateCall,
    Create2,
}

impl Target {
    pub const fn code(&self) -> u8 {
        match self {
            Target::SelfDestruct => SELFDESTRUCT,
            Target::DelegateCall => DELEGATECALL,
            Target::Create2 => CREATE2,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Target::SelfDestruct => "SELFDESTRUCT",
            Target::DelegateCall => "DELEGATECALL",
            Target::Create2 => "CREATE2",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
