use std::fmt;

/// Number of registers handed out to expression evaluation (`r0`..`r9`).
pub const POOL_SIZE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(pub u8);

/// Address temporary, never allocated.
pub const SCRATCH: Reg = Reg(10);
/// Instance pointer of the running scope; static links hang off it.
pub const LINK: Reg = Reg(12);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Per-scope allocator over `r0`..`r9`.
///
/// Exhaustion is reported as `None`; spilling is the caller's business.
#[derive(Debug, Clone, Default)]
pub struct RegisterPool {
    busy: [bool; POOL_SIZE as usize],
    high_water: Option<u8>,
}

impl RegisterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest free register.
    pub fn acquire(&mut self) -> Option<Reg> {
        let index = self.busy.iter().position(|b| !b)?;
        self.busy[index] = true;
        let index = index as u8;
        if self.high_water.map_or(true, |hw| index > hw) {
            self.high_water = Some(index);
        }
        Some(Reg(index))
    }

    pub fn release(&mut self, reg: Reg) {
        let slot = &mut self.busy[reg.0 as usize];
        debug_assert!(*slot, "releasing free register {reg}");
        *slot = false;
    }

    /// Highest index ever handed out by this pool.
    pub fn high_water(&self) -> Option<u8> {
        self.high_water
    }

    pub fn in_use(&self) -> usize {
        self.busy.iter().filter(|b| **b).count()
    }

    /// Bytes taken by the save set `{r0..rN, r12, lr}`.
    pub fn save_bytes(&self) -> u32 {
        4 * (self.high_water.map_or(0, |hw| hw as u32 + 1) + 2)
    }

    /// Register list pushed at scope entry; `tail` is `lr` or `pc`.
    pub fn save_list(&self, tail: &str) -> String {
        let mut regs: Vec<String> = match self.high_water {
            Some(hw) => (0..=hw).map(|r| Reg(r).to_string()).collect(),
            None => Vec::new(),
        };
        regs.push(LINK.to_string());
        regs.push(tail.to_string());
        regs.join(", ")
    }
}
