//! Named register runs over the physical address spaces.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Default name for a synthesized quantum register.
pub const DEFAULT_QREG: &str = "q";
/// Default name for a synthesized classical register.
pub const DEFAULT_CREG: &str = "c";
/// Default name for a synthesized ancillary register.
pub const DEFAULT_ANCREG: &str = "anc";

/// A contiguous run of physical indices assigned to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// First physical index of the run.
    pub start: u32,
    /// Number of indices in the run.
    pub size: u32,
}

impl Register {
    /// Create a register run.
    pub fn new(start: u32, size: u32) -> Self {
        Self { start, size }
    }

    /// One past the last index of the run.
    pub fn end(&self) -> u32 {
        self.start + self.size
    }

    /// Whether the run covers the given index.
    pub fn contains(&self, index: u32) -> bool {
        self.start <= index && index < self.end()
    }
}

/// Name-indexed register runs.
pub type RegisterMap = FxHashMap<String, Register>;

/// Find the register covering `index`, returning its name and the offset
/// within the run.
pub fn locate(regs: &RegisterMap, index: u32) -> Option<(&str, u32)> {
    regs.iter()
        .find(|(_, reg)| reg.contains(index))
        .map(|(name, reg)| (name.as_str(), index - reg.start))
}

/// Registers sorted by their start index, for deterministic emission.
pub fn sorted_by_start(regs: &RegisterMap) -> Vec<(&str, Register)> {
    let mut sorted: Vec<_> = regs.iter().map(|(n, r)| (n.as_str(), *r)).collect();
    sorted.sort_by_key(|(_, r)| r.start);
    sorted
}

/// Fuse every adjacent `<name>_l` + `<name>_h` pair whose runs join back
/// into `<name>`. Runs greedily to a fixed point; idempotent.
pub fn consolidate(regs: &mut RegisterMap) {
    loop {
        let mut fused = None;
        for (name, reg) in regs.iter() {
            let Some(base) = name.strip_suffix("_l") else {
                continue;
            };
            let high_name = format!("{base}_h");
            if let Some(high) = regs.get(&high_name) {
                if reg.end() == high.start {
                    fused = Some((
                        name.clone(),
                        high_name,
                        base.to_string(),
                        Register::new(reg.start, reg.size + high.size),
                    ));
                    break;
                }
            }
        }
        match fused {
            Some((low_name, high_name, base, merged)) => {
                regs.remove(&low_name);
                regs.remove(&high_name);
                regs.insert(base, merged);
            }
            None => break,
        }
    }
}
