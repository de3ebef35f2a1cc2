use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::hint_processor::builtin_hint_processor::dict_manager::DictManager;
use crate::vm::errors::{exec_scope_errors::ExecScopeError, hint_errors::HintError};

/// A stack of name -> value maps. Hints may push and pop scopes; variable
/// lookup goes to the innermost scope holding the name.
pub struct ExecutionScopes {
    pub data: Vec<HashMap<String, Box<dyn Any>>>,
}

impl ExecutionScopes {
    pub fn new() -> ExecutionScopes {
        ExecutionScopes {
            data: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self, new_scope_locals: HashMap<String, Box<dyn Any>>) {
        self.data.push(new_scope_locals);
    }

    pub fn exit_scope(&mut self) -> Result<(), ExecScopeError> {
        if self.data.len() == 1 {
            return Err(ExecScopeError::ExitMainScopeError);
        }
        self.data.pop();
        Ok(())
    }

    pub fn get_local_variables(&self) -> Result<&HashMap<String, Box<dyn Any>>, HintError> {
        self.data
            .last()
            .ok_or(HintError::FromScopeError(ExecScopeError::NoScopeError))
    }

    pub fn get_local_variables_mut(
        &mut self,
    ) -> Result<&mut HashMap<String, Box<dyn Any>>, HintError> {
        self.data
            .last_mut()
            .ok_or(HintError::FromScopeError(ExecScopeError::NoScopeError))
    }

    pub fn assign_or_update_variable(&mut self, var_name: &str, var_value: Box<dyn Any>) {
        if let Ok(local_variables) = self.get_local_variables_mut() {
            local_variables.insert(var_name.to_string(), var_value);
        }
    }

    pub fn insert_value<T: 'static>(&mut self, name: &str, value: T) {
        self.assign_or_update_variable(name, Box::new(value));
    }

    pub fn insert_box(&mut self, name: &str, value: Box<dyn Any>) {
        self.assign_or_update_variable(name, value);
    }

    pub fn delete_variable(&mut self, var_name: &str) {
        if let Ok(local_variables) = self.get_local_variables_mut() {
            local_variables.remove(var_name);
        }
    }

    /// Looks the name up walking the scopes inner to outer and returns a
    /// clone of the value, which must be of type T.
    pub fn get<T: Any + Clone>(&self, name: &str) -> Result<T, HintError> {
        self.get_ref(name).cloned()
    }

    pub fn get_ref<T: Any>(&self, name: &str) -> Result<&T, HintError> {
        for scope in self.data.iter().rev() {
            if let Some(variable) = scope.get(name) {
                return variable
                    .downcast_ref::<T>()
                    .ok_or_else(|| HintError::WrongScopeVariableType(name.to_string()));
            }
        }
        Err(HintError::VariableNotInScope(name.to_string()))
    }

    pub fn get_mut_ref<T: Any>(&mut self, name: &str) -> Result<&mut T, HintError> {
        for scope in self.data.iter_mut().rev() {
            if let Some(variable) = scope.get_mut(name) {
                return variable
                    .downcast_mut::<T>()
                    .ok_or_else(|| HintError::WrongScopeVariableType(name.to_string()));
            }
        }
        Err(HintError::VariableNotInScope(name.to_string()))
    }

    /// The dict manager lives in the scopes under `__dict_manager`, shared
    /// between the trackers and the dict hints.
    pub fn get_dict_manager(&self) -> Result<Rc<RefCell<DictManager>>, HintError> {
        self.get::<Rc<RefCell<DictManager>>>("__dict_manager")
    }
}

impl Default for ExecutionScopes {
    fn default() -> Self {
        Self::new()
    }
}
