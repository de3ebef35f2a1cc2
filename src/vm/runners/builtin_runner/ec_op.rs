use std::cell::RefCell;
use std::collections::HashMap;

use felt::Felt252;
use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Num, One, Zero};

use crate::math_utils::{ec_add, ec_double};
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

use super::EC_OP_BUILTIN_NAME;

pub const CELLS_PER_EC_OP: u32 = 7;
pub const INPUT_CELLS_PER_EC_OP: u32 = 5;
const SCALAR_HEIGHT: usize = 256;

lazy_static! {
    static ref FIELD_PRIME: BigInt = BigInt::from_str_radix(
        "3618502788666131213697322783095070105623107215331596699973092056135872020481",
        10
    )
    .expect("hardcoded");
    static ref BETA: BigInt = BigInt::from_str_radix(
        "3141592653589793238462643383279502884197169399375105820974944592307816406665",
        10
    )
    .expect("hardcoded");
}

#[derive(Debug)]
pub struct EcOpBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    n_input_cells: u32,
    cache: RefCell<HashMap<Relocatable, Felt252>>,
}

impl EcOpBuiltinRunner {
    pub fn new(included: bool) -> Self {
        EcOpBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_EC_OP,
            n_input_cells: INPUT_CELLS_PER_EC_OP,
            cache: RefCell::new(HashMap::new()),
        }
    }

    ///Returns True if the point (x, y) is on the elliptic curve defined as
    ///y^2 = x^3 + alpha * x + beta (mod p).
    fn point_on_curve(x: &BigInt, y: &BigInt, alpha: &BigInt, beta: &BigInt, prime: &BigInt) -> bool {
        y.pow(2).mod_floor(prime) == (x.pow(3) + alpha * x + beta).mod_floor(prime)
    }

    ///Returns the result of the EC operation P + m * Q,
    /// where P = partial_sum and Q = doubled_point, on the curve
    /// y^2 = x^3 + alpha * x + beta (mod prime).
    /// Mimics the operation of the AIR, so that this function fails whenever
    /// the builtin AIR would not yield a correct result, i.e. when any part
    /// of the computation attempts to add two points with the same x
    /// coordinate.
    fn ec_op_impl(
        mut partial_sum: (BigInt, BigInt),
        mut doubled_point: (BigInt, BigInt),
        m: &BigInt,
        alpha: &BigInt,
        prime: &BigInt,
        height: usize,
    ) -> Result<(BigInt, BigInt), RunnerError> {
        let mut slope = m.clone();
        for _ in 0..height {
            if slope.is_zero() {
                break;
            }
            if (&doubled_point.0 - &partial_sum.0).mod_floor(prime).is_zero() {
                return Err(RunnerError::EcOpSameXCoordinate(format!(
                    "partial_sum: ({}, {}), doubled_point: ({}, {})",
                    partial_sum.0, partial_sum.1, doubled_point.0, doubled_point.1
                )));
            };
            if slope.is_odd() {
                partial_sum = ec_add(partial_sum, doubled_point.clone(), prime)?;
            }
            doubled_point = ec_double(doubled_point, alpha, prime)?;
            slope >>= 1_i32;
        }
        Ok(partial_sum)
    }

    pub fn initialize_segments(&mut self, segments: &mut MemorySegmentManager) {
        self.base = segments.add().segment_index as usize
    }

    pub fn initial_stack(&self) -> Vec<MaybeRelocatable> {
        if self.included {
            vec![MaybeRelocatable::from((self.base as isize, 0))]
        } else {
            vec![]
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn deduce_memory_cell(
        &self,
        address: Relocatable,
        memory: &Memory,
    ) -> Result<Option<MaybeRelocatable>, RunnerError> {
        const EC_POINT_INDICES: [(usize, usize); 2] = [(0, 1), (2, 3)];
        const M_INDEX: usize = 4;
        let alpha: BigInt = BigInt::one();

        let index = address.offset % self.cells_per_instance as usize;
        if index != 5 && index != 6 {
            return Ok(None);
        }
        if let Some(felt) = self.cache.borrow().get(&address) {
            return Ok(Some(felt.into()));
        }
        let instance = Relocatable {
            segment_index: address.segment_index,
            offset: address.offset - index,
        };
        //All input cells should be filled with integer values; a missing one
        //means the instance cannot be deduced yet.
        let mut input_cells = Vec::with_capacity(self.n_input_cells as usize);
        for i in 0..self.n_input_cells as usize {
            match memory.get(&(instance + i)) {
                None => return Ok(None),
                Some(MaybeRelocatable::Int(num)) => input_cells.push(num.to_bigint()),
                Some(MaybeRelocatable::RelocatableValue(_)) => {
                    return Err(RunnerError::BuiltinExpectedInteger(
                        EC_OP_BUILTIN_NAME,
                        instance + i,
                    ))
                }
            }
        }
        for pair in &EC_POINT_INDICES {
            let (x, y) = (&input_cells[pair.0], &input_cells[pair.1]);
            if !Self::point_on_curve(x, y, &alpha, &BETA, &FIELD_PRIME) {
                return Err(RunnerError::PointNotOnCurve((
                    Felt252::from(x.clone()),
                    Felt252::from(y.clone()),
                )));
            };
        }
        let result = Self::ec_op_impl(
            (input_cells[0].clone(), input_cells[1].clone()),
            (input_cells[2].clone(), input_cells[3].clone()),
            &input_cells[M_INDEX],
            &alpha,
            &FIELD_PRIME,
            SCALAR_HEIGHT,
        )?;
        self.cache.borrow_mut().insert(
            instance + self.n_input_cells as usize,
            Felt252::from(result.0),
        );
        self.cache.borrow_mut().insert(
            instance + (self.n_input_cells as usize + 1),
            Felt252::from(result.1),
        );
        Ok(self.cache.borrow().get(&address).map(MaybeRelocatable::from))
    }
}
