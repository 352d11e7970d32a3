//! Register identities.
//!
//! This module defines the identities the renaming machinery moves around. It provides:
//! 1. **Register Classes:** Integer, floating-point, vector, vector-element, predicate, and
//!    condition-code registers.
//! 2. **Architectural Identity:** `RegId`, the register an instruction names.
//! 3. **Physical Identity:** `PhysRegId`, one slot of the physical register file.
//! 4. **Vector Addressing:** `VecMode`, whole-register versus per-element renaming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hardware thread index within one CPU.
pub type ThreadId = usize;

/// Global, monotonically increasing instruction sequence number.
pub type SeqNum = u64;

/// Register class. Each class has its own architectural namespace and its own
/// pool of physical registers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum RegClass {
    /// Integer registers.
    Int,
    /// Floating-point registers.
    Float,
    /// Whole vector registers.
    Vec,
    /// Individual vector lanes, aliasing `Vec` storage.
    VecElem,
    /// Vector predicate registers.
    VecPred,
    /// Condition-code registers.
    CondCode,
}

impl RegClass {
    /// Every register class, in register-file layout order.
    pub const ALL: [Self; 6] = [
        Self::Int,
        Self::Float,
        Self::Vec,
        Self::VecElem,
        Self::VecPred,
        Self::CondCode,
    ];

    /// Number of register classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of this class, for per-class tables.
    #[inline]
    pub const fn idx(self) -> usize {
        self as usize
    }

    /// Returns true for the two classes whose liveness depends on the vector mode.
    #[inline]
    pub const fn is_vector(self) -> bool {
        matches!(self, Self::Vec | Self::VecElem)
    }

    /// Short prefix used when printing register identities.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Int => "r",
            Self::Float => "f",
            Self::Vec | Self::VecElem => "v",
            Self::VecPred => "p",
            Self::CondCode => "cc",
        }
    }
}

impl fmt::Display for RegClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Vec => "Vec",
            Self::VecElem => "VecElem",
            Self::VecPred => "VecPred",
            Self::CondCode => "CondCode",
        };
        f.write_str(name)
    }
}

/// Architectural register identity as named by an instruction.
///
/// `elem` is only meaningful for `RegClass::VecElem`, where `index` names the
/// vector register and `elem` the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegId {
    /// Register class.
    pub class: RegClass,
    /// Register index within the class.
    pub index: u16,
    /// Lane index for vector-element registers, zero otherwise.
    #[serde(default)]
    pub elem: u16,
}

impl RegId {
    /// Creates a non-element register identity.
    #[inline]
    pub const fn new(class: RegClass, index: u16) -> Self {
        Self {
            class,
            index,
            elem: 0,
        }
    }

    /// Integer register `index`.
    #[inline]
    pub const fn int(index: u16) -> Self {
        Self::new(RegClass::Int, index)
    }

    /// Floating-point register `index`.
    #[inline]
    pub const fn float(index: u16) -> Self {
        Self::new(RegClass::Float, index)
    }

    /// Whole vector register `index`.
    #[inline]
    pub const fn vec(index: u16) -> Self {
        Self::new(RegClass::Vec, index)
    }

    /// Lane `elem` of vector register `index`.
    #[inline]
    pub const fn vec_elem(index: u16, elem: u16) -> Self {
        Self {
            class: RegClass::VecElem,
            index,
            elem,
        }
    }

    /// Vector predicate register `index`.
    #[inline]
    pub const fn vec_pred(index: u16) -> Self {
        Self::new(RegClass::VecPred, index)
    }

    /// Condition-code register `index`.
    #[inline]
    pub const fn cc(index: u16) -> Self {
        Self::new(RegClass::CondCode, index)
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class == RegClass::VecElem {
            write!(f, "v{}[{}]", self.index, self.elem)
        } else {
            write!(f, "{}{}", self.class.prefix(), self.index)
        }
    }
}

/// One physical register.
///
/// `index` is the position within its class; `flat` is the position in the
/// whole register file and is what the scoreboard indexes by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysRegId {
    /// Register class.
    pub class: RegClass,
    /// Index within the class.
    pub index: u32,
    /// Index within the whole register file.
    pub flat: u32,
}

impl fmt::Display for PhysRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.class.prefix(), self.index)
    }
}

/// Vector renaming discipline.
///
/// All threads of one CPU share the mode because they share the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum VecMode {
    /// Whole vector registers are renamed.
    #[default]
    Full,
    /// Individual lanes are renamed.
    Elem,
}

impl VecMode {
    /// Returns true if `class` is addressable in this mode.
    #[inline]
    pub const fn addresses(self, class: RegClass) -> bool {
        match class {
            RegClass::Vec => matches!(self, Self::Full),
            RegClass::VecElem => matches!(self, Self::Elem),
            _ => true,
        }
    }
}
