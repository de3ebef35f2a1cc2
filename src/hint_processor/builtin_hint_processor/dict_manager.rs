use std::collections::HashMap;

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::hint_errors::{DictError, HintError};
use crate::vm::vm_core::VirtualMachine;

///Manages the dictionaries of a Cairo run. Trackers are looked up by the
///segment index of the dict's memory segment.
#[derive(PartialEq, Debug)]
pub struct DictManager {
    pub trackers: HashMap<isize, DictTracker>,
}

///The host-side view of a single Cairo dictionary.
#[derive(PartialEq, Debug)]
pub struct DictTracker {
    pub data: Dictionary,
    //Pointer to the first unused position in the dict segment.
    pub current_ptr: Relocatable,
}

#[derive(PartialEq, Debug)]
pub enum Dictionary {
    SimpleDictionary(HashMap<MaybeRelocatable, MaybeRelocatable>),
    DefaultDictionary {
        dict: HashMap<MaybeRelocatable, MaybeRelocatable>,
        default_value: MaybeRelocatable,
    },
}

impl Dictionary {
    fn get(&mut self, key: &MaybeRelocatable) -> Option<&MaybeRelocatable> {
        match self {
            Self::SimpleDictionary(dict) => dict.get(key),
            Self::DefaultDictionary {
                dict,
                default_value,
            } => Some(
                dict.entry(key.clone())
                    .or_insert_with(|| default_value.clone()),
            ),
        }
    }

    fn insert(&mut self, key: &MaybeRelocatable, value: &MaybeRelocatable) {
        let dict = match self {
            Self::SimpleDictionary(dict) => dict,
            Self::DefaultDictionary { dict, .. } => dict,
        };
        dict.insert(key.clone(), value.clone());
    }
}

impl DictManager {
    pub fn new() -> Self {
        DictManager {
            trackers: HashMap::new(),
        }
    }

    ///Creates a new Cairo dictionary seeded with initial_dict, backed by a
    ///fresh memory segment.
    pub fn new_dict(
        &mut self,
        vm: &mut VirtualMachine,
        initial_dict: HashMap<MaybeRelocatable, MaybeRelocatable>,
    ) -> Result<MaybeRelocatable, HintError> {
        let base = vm.add_memory_segment();
        if self.trackers.contains_key(&base.segment_index) {
            return Err(DictError::CantCreateDictionaryOnTakenSegment(
                base.segment_index,
            )
            .into());
        }
        self.trackers.insert(
            base.segment_index,
            DictTracker::new_with_initial(base, initial_dict),
        );
        Ok(MaybeRelocatable::RelocatableValue(base))
    }

    ///Creates a new Cairo default dictionary, where reading a missing key
    ///yields (and records) the default value.
    pub fn new_default_dict(
        &mut self,
        vm: &mut VirtualMachine,
        default_value: &MaybeRelocatable,
        initial_dict: Option<HashMap<MaybeRelocatable, MaybeRelocatable>>,
    ) -> Result<MaybeRelocatable, HintError> {
        let base = vm.add_memory_segment();
        if self.trackers.contains_key(&base.segment_index) {
            return Err(DictError::CantCreateDictionaryOnTakenSegment(
                base.segment_index,
            )
            .into());
        }
        self.trackers.insert(
            base.segment_index,
            DictTracker::new_default_dict(base, default_value, initial_dict),
        );
        Ok(MaybeRelocatable::RelocatableValue(base))
    }

    ///Returns the tracker whose current_ptr matches the given dict_ptr.
    pub fn get_tracker_mut(
        &mut self,
        dict_ptr: Relocatable,
    ) -> Result<&mut DictTracker, HintError> {
        let tracker = self
            .trackers
            .get_mut(&dict_ptr.segment_index)
            .ok_or(DictError::NoTrackerForSegment(dict_ptr.segment_index))?;
        if tracker.current_ptr != dict_ptr {
            return Err(DictError::WrongDictPointer(dict_ptr, tracker.current_ptr).into());
        }
        Ok(tracker)
    }

    pub fn get_tracker(&self, dict_ptr: Relocatable) -> Result<&DictTracker, HintError> {
        let tracker = self
            .trackers
            .get(&dict_ptr.segment_index)
            .ok_or(DictError::NoTrackerForSegment(dict_ptr.segment_index))?;
        if tracker.current_ptr != dict_ptr {
            return Err(DictError::WrongDictPointer(dict_ptr, tracker.current_ptr).into());
        }
        Ok(tracker)
    }
}

impl Default for DictManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DictTracker {
    pub fn new_empty(base: Relocatable) -> Self {
        DictTracker {
            data: Dictionary::SimpleDictionary(HashMap::new()),
            current_ptr: base,
        }
    }

    pub fn new_with_initial(
        base: Relocatable,
        initial_dict: HashMap<MaybeRelocatable, MaybeRelocatable>,
    ) -> Self {
        DictTracker {
            data: Dictionary::SimpleDictionary(initial_dict),
            current_ptr: base,
        }
    }

    pub fn new_default_dict(
        base: Relocatable,
        default_value: &MaybeRelocatable,
        initial_dict: Option<HashMap<MaybeRelocatable, MaybeRelocatable>>,
    ) -> Self {
        DictTracker {
            data: Dictionary::DefaultDictionary {
                dict: initial_dict.unwrap_or_default(),
                default_value: default_value.clone(),
            },
            current_ptr: base,
        }
    }

    pub fn get_value(&mut self, key: &MaybeRelocatable) -> Result<&MaybeRelocatable, HintError> {
        self.data
            .get(key)
            .ok_or_else(|| HintError::DictKeyNotFound(key.clone()))
    }

    pub fn insert_value(&mut self, key: &MaybeRelocatable, val: &MaybeRelocatable) {
        self.data.insert(key, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;

    #[test]
    fn new_dict_allocates_a_segment_and_registers_a_tracker() {
        let mut dict_manager = DictManager::new();
        let mut vm = vm!();
        vm.segments.add();
        vm.segments.add();
        let base = dict_manager.new_dict(&mut vm, HashMap::new()).unwrap();
        assert_eq!(base, mayberelocatable!(2, 0));
        assert_eq!(
            dict_manager.trackers.get(&2),
            Some(&DictTracker::new_empty(relocatable!(2, 0)))
        );
    }

    #[test]
    fn new_dict_on_taken_segment_fails() {
        let mut dict_manager = DictManager::new();
        let mut vm = vm!();
        dict_manager
            .trackers
            .insert(0, DictTracker::new_empty(relocatable!(0, 0)));
        assert_matches!(
            dict_manager.new_dict(&mut vm, HashMap::new()),
            Err(HintError::Dict(
                DictError::CantCreateDictionaryOnTakenSegment(0)
            ))
        );
    }

    #[test]
    fn default_dictionary_returns_default_for_missing_key() {
        let mut tracker = DictTracker::new_default_dict(
            relocatable!(0, 0),
            &mayberelocatable!(17),
            None,
        );
        assert_eq!(
            tracker.get_value(&mayberelocatable!(5)),
            Ok(&mayberelocatable!(17))
        );
    }

    #[test]
    fn simple_dictionary_missing_key_fails() {
        let mut tracker = DictTracker::new_empty(relocatable!(0, 0));
        assert_matches!(
            tracker.get_value(&mayberelocatable!(5)),
            Err(HintError::DictKeyNotFound(_))
        );
    }

    #[test]
    fn get_tracker_checks_the_pointer() {
        let mut dict_manager = DictManager::new();
        dict_manager
            .trackers
            .insert(2, DictTracker::new_empty(relocatable!(2, 3)));
        assert_matches!(
            dict_manager.get_tracker(relocatable!(2, 0)),
            Err(HintError::Dict(DictError::WrongDictPointer(
                got,
                expected
            ))) if got == relocatable!(2, 0) && expected == relocatable!(2, 3)
        );
        assert!(dict_manager.get_tracker(relocatable!(2, 3)).is_ok());
        assert_matches!(
            dict_manager.get_tracker(relocatable!(4, 0)),
            Err(HintError::Dict(DictError::NoTrackerForSegment(4)))
        );
    }
}
