use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use felt::Felt252;
use starknet_crypto::{verify, FieldElement, Signature};

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::memory_errors::MemoryError;
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::{Memory, ValidationRule};
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

pub const CELLS_PER_SIGNATURE: u32 = 2;

/// ECDSA builtin. Signatures cannot be deduced from memory; they are handed
/// to the runner out of band and checked when the (pubkey, message) pair of
/// an instance completes.
#[derive(Debug)]
pub struct SignatureBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    signatures: Rc<RefCell<HashMap<Relocatable, Signature>>>,
}

impl SignatureBuiltinRunner {
    pub fn new(included: bool) -> Self {
        SignatureBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_SIGNATURE,
            signatures: Rc::new(RefCell::new(HashMap::new())),
        }
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

    /// Registers the (r, s) signature for the instance whose public key
    /// lives at `relocatable`.
    pub fn add_signature(
        &mut self,
        relocatable: Relocatable,
        (r, s): &(Felt252, Felt252),
    ) -> Result<(), RunnerError> {
        let (r, s) = (
            FieldElement::from_bytes_be(&r.to_be_bytes())
                .map_err(|_| RunnerError::InvalidSignature(relocatable))?,
            FieldElement::from_bytes_be(&s.to_be_bytes())
                .map_err(|_| RunnerError::InvalidSignature(relocatable))?,
        );
        self.signatures
            .borrow_mut()
            .entry(relocatable)
            .or_insert(Signature { r, s });
        Ok(())
    }

    pub fn add_validation_rule(&self, memory: &mut Memory) {
        let cells_per_instance = self.cells_per_instance as usize;
        let signatures = Rc::clone(&self.signatures);
        let rule: ValidationRule = ValidationRule(Box::new(
            move |memory: &Memory, addr: Relocatable| -> Result<Vec<Relocatable>, MemoryError> {
                let cell_index = addr.offset % cells_per_instance;
                let (pubkey_addr, message_addr) = match cell_index {
                    0 => (addr, addr + 1_usize),
                    1 => match addr.sub_usize(1) {
                        Ok(prev_addr) => (prev_addr, addr),
                        Err(_) => return Ok(vec![]),
                    },
                    _ => return Ok(vec![]),
                };
                // Validation fires once the second half of the pair arrives.
                let pubkey = match memory.get_integer(pubkey_addr) {
                    Ok(num) => num,
                    Err(_) if cell_index == 1 => return Ok(vec![]),
                    Err(_) => return Err(MemoryError::ExpectedFelt(pubkey_addr)),
                };
                let msg = match memory.get_integer(message_addr) {
                    Ok(num) => num,
                    Err(_) if cell_index == 0 => return Ok(vec![]),
                    Err(_) => return Err(MemoryError::ExpectedFelt(message_addr)),
                };
                let signatures_map = signatures.borrow();
                let signature = signatures_map
                    .get(&pubkey_addr)
                    .ok_or(MemoryError::SignatureNotFound(pubkey_addr))?;
                let public_key = FieldElement::from_bytes_be(&pubkey.to_be_bytes())
                    .map_err(|_| MemoryError::ExpectedFelt(pubkey_addr))?;
                let message = FieldElement::from_bytes_be(&msg.to_be_bytes())
                    .map_err(|_| MemoryError::ExpectedFelt(message_addr))?;
                match verify(&public_key, &message, &signature.r, &signature.s) {
                    Ok(true) => Ok(vec![pubkey_addr, message_addr]),
                    _ => Err(MemoryError::InvalidSignature(pubkey_addr)),
                }
            },
        ));
        memory.add_validation_rule(self.base, rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocatable;

    #[test]
    fn add_signature_is_idempotent_per_address() {
        let mut builtin = SignatureBuiltinRunner::new(true);
        let r = Felt252::from(1_u32);
        let s = Felt252::from(2_u32);
        builtin
            .add_signature(relocatable!(0, 0), &(r.clone(), s.clone()))
            .unwrap();
        builtin
            .add_signature(relocatable!(0, 0), &(Felt252::from(9_u32), s))
            .unwrap();
        let signatures = builtin.signatures.borrow();
        let stored = signatures.get(&relocatable!(0, 0)).unwrap();
        assert_eq!(
            Felt252::from_bytes_be(&stored.r.to_bytes_be()),
            Felt252::from(1_u32)
        );
    }

    #[test]
    fn half_filled_instance_does_not_validate() {
        let mut builtin = SignatureBuiltinRunner::new(true);
        let mut segments = MemorySegmentManager::new();
        builtin.initialize_segments(&mut segments);
        let mut memory = segments.memory;
        builtin.add_validation_rule(&mut memory);
        // Only the public key cell of the pair is present.
        assert_eq!(
            memory.insert(relocatable!(0, 0), &MaybeRelocatable::Int(Felt252::from(7_u32))),
            Ok(())
        );
    }
}
