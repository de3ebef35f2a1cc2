use std::fmt::{self, Display};
use std::ops::{Add, AddAssign};

use felt::Felt252;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::relocatable;
use crate::types::errors::math_errors::MathError;

/// A segment-relative address. Segment indexes below zero denote temporary
/// segments that only exist while the run is being constructed.
#[derive(Eq, Hash, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Relocatable {
    pub segment_index: isize,
    pub offset: usize,
}

#[derive(Eq, Hash, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum MaybeRelocatable {
    RelocatableValue(Relocatable),
    Int(Felt252),
}

impl From<(isize, usize)> for Relocatable {
    fn from(index_offset: (isize, usize)) -> Self {
        Relocatable {
            segment_index: index_offset.0,
            offset: index_offset.1,
        }
    }
}

impl From<(isize, usize)> for MaybeRelocatable {
    fn from(index_offset: (isize, usize)) -> Self {
        MaybeRelocatable::RelocatableValue(Relocatable::from(index_offset))
    }
}

impl From<Relocatable> for MaybeRelocatable {
    fn from(rel: Relocatable) -> Self {
        MaybeRelocatable::RelocatableValue(rel)
    }
}

impl From<&Relocatable> for MaybeRelocatable {
    fn from(rel: &Relocatable) -> Self {
        MaybeRelocatable::RelocatableValue(*rel)
    }
}

impl From<Felt252> for MaybeRelocatable {
    fn from(num: Felt252) -> Self {
        MaybeRelocatable::Int(num)
    }
}

impl From<&Felt252> for MaybeRelocatable {
    fn from(num: &Felt252) -> Self {
        MaybeRelocatable::Int(num.clone())
    }
}

impl From<usize> for MaybeRelocatable {
    fn from(num: usize) -> Self {
        MaybeRelocatable::Int(Felt252::from(num))
    }
}

impl From<&MaybeRelocatable> for MaybeRelocatable {
    fn from(other: &MaybeRelocatable) -> Self {
        other.clone()
    }
}

impl Display for Relocatable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.segment_index, self.offset)
    }
}

impl Display for MaybeRelocatable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MaybeRelocatable::RelocatableValue(rel) => rel.fmt(f),
            MaybeRelocatable::Int(num) => num.fmt(f),
        }
    }
}

impl Add<usize> for Relocatable {
    type Output = Relocatable;
    fn add(self, other: usize) -> Self {
        relocatable!(self.segment_index, self.offset + other)
    }
}

impl Add<i32> for Relocatable {
    type Output = Relocatable;
    fn add(self, other: i32) -> Self {
        if other >= 0 {
            relocatable!(self.segment_index, self.offset + other as usize)
        } else {
            relocatable!(
                self.segment_index,
                self.offset - other.unsigned_abs() as usize
            )
        }
    }
}

impl AddAssign<usize> for Relocatable {
    fn add_assign(&mut self, rhs: usize) {
        self.offset += rhs
    }
}

impl Relocatable {
    /// Adds a Felt252 to self; the resulting offset must fit in a usize.
    pub fn add_int(&self, other: &Felt252) -> Result<Relocatable, MathError> {
        let new_offset = (other + self.offset).to_usize().ok_or_else(|| {
            MathError::RelocatableAddFeltOffsetExceeded(*self, other.clone())
        })?;
        Ok(relocatable!(self.segment_index, new_offset))
    }

    /// Adds a MaybeRelocatable to self; two addresses cannot be added.
    pub fn add_maybe(&self, other: &MaybeRelocatable) -> Result<Relocatable, MathError> {
        match other {
            MaybeRelocatable::Int(num) => self.add_int(num),
            MaybeRelocatable::RelocatableValue(rel) => {
                Err(MathError::RelocatableAdd(*self, *rel))
            }
        }
    }

    pub fn sub_usize(&self, other: usize) -> Result<Relocatable, MathError> {
        if self.offset < other {
            return Err(MathError::SegmentSubOffset(*self, other));
        }
        Ok(relocatable!(self.segment_index, self.offset - other))
    }

    /// Distance between two addresses of the same segment.
    pub fn sub(&self, other: &Relocatable) -> Result<usize, MathError> {
        if self.segment_index != other.segment_index {
            return Err(MathError::CantSubRelocatablesDifferentSegments(
                *self, *other,
            ));
        }
        if self.offset < other.offset {
            return Err(MathError::SegmentSubOffset(*self, other.offset));
        }
        Ok(self.offset - other.offset)
    }
}

impl MaybeRelocatable {
    pub fn add_int(&self, other: &Felt252) -> Result<MaybeRelocatable, MathError> {
        match self {
            MaybeRelocatable::Int(value) => Ok(MaybeRelocatable::Int(value + other)),
            MaybeRelocatable::RelocatableValue(rel) => Ok(rel.add_int(other)?.into()),
        }
    }

    pub fn add_usize(&self, other: usize) -> MaybeRelocatable {
        match self {
            MaybeRelocatable::Int(value) => MaybeRelocatable::Int(value + other),
            MaybeRelocatable::RelocatableValue(rel) => (*rel + other).into(),
        }
    }

    /// Adds two MaybeRelocatable values; address + address fails.
    pub fn add(&self, other: &MaybeRelocatable) -> Result<MaybeRelocatable, MathError> {
        match (self, other) {
            (MaybeRelocatable::Int(num_a), MaybeRelocatable::Int(num_b)) => {
                Ok(MaybeRelocatable::Int(num_a + num_b))
            }
            (
                MaybeRelocatable::RelocatableValue(rel_a),
                MaybeRelocatable::RelocatableValue(rel_b),
            ) => Err(MathError::RelocatableAdd(*rel_a, *rel_b)),
            (MaybeRelocatable::RelocatableValue(rel), MaybeRelocatable::Int(num))
            | (MaybeRelocatable::Int(num), MaybeRelocatable::RelocatableValue(rel)) => {
                Ok(rel.add_int(num)?.into())
            }
        }
    }

    /// Subtracts two MaybeRelocatable values. Addresses may only be
    /// subtracted within the same segment.
    pub fn sub(&self, other: &MaybeRelocatable) -> Result<MaybeRelocatable, MathError> {
        match (self, other) {
            (MaybeRelocatable::Int(num_a), MaybeRelocatable::Int(num_b)) => {
                Ok(MaybeRelocatable::Int(num_a - num_b))
            }
            (
                MaybeRelocatable::RelocatableValue(rel_a),
                MaybeRelocatable::RelocatableValue(rel_b),
            ) => Ok(MaybeRelocatable::Int(Felt252::from(rel_a.sub(rel_b)?))),
            (MaybeRelocatable::RelocatableValue(rel), MaybeRelocatable::Int(num)) => {
                let new_offset = (Felt252::from(rel.offset) - num).to_usize().ok_or_else(
                    || MathError::RelocatableAddFeltOffsetExceeded(*rel, num.clone()),
                )?;
                Ok(MaybeRelocatable::from((rel.segment_index, new_offset)))
            }
            (MaybeRelocatable::Int(num), MaybeRelocatable::RelocatableValue(rel)) => {
                Err(MathError::SubRelocatableFromInt(num.clone(), *rel))
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, MaybeRelocatable::Int(num) if num.is_zero())
    }

    pub fn get_int_ref(&self) -> Option<&Felt252> {
        match self {
            MaybeRelocatable::Int(num) => Some(num),
            MaybeRelocatable::RelocatableValue(_) => None,
        }
    }

    pub fn get_int(&self) -> Option<Felt252> {
        self.get_int_ref().cloned()
    }

    pub fn get_relocatable(&self) -> Option<Relocatable> {
        match self {
            MaybeRelocatable::RelocatableValue(rel) => Some(*rel),
            MaybeRelocatable::Int(_) => None,
        }
    }
}
