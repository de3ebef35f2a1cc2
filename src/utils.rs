#[macro_export]
macro_rules! relocatable {
    ($val1 : expr, $val2 : expr) => {
        $crate::types::relocatable::Relocatable {
            segment_index: $val1,
            offset: $val2,
        }
    };
}

#[macro_export]
macro_rules! mayberelocatable {
    ($val1 : expr, $val2 : expr) => {
        $crate::types::relocatable::MaybeRelocatable::from(($val1 as isize, $val2 as usize))
    };
    ($val1 : expr) => {
        $crate::types::relocatable::MaybeRelocatable::Int(felt::Felt252::from($val1 as i64))
    };
}

#[macro_export]
macro_rules! any_box {
    ($val : expr) => {
        Box::new($val) as Box<dyn std::any::Any>
    };
}
