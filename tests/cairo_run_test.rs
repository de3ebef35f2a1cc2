use cairo_exec::hint_processor::builtin_hint_processor::builtin_hint_processor_definition::BuiltinHintProcessor;
use cairo_exec::types::program::Program;
use cairo_exec::types::relocatable::{MaybeRelocatable, Relocatable};
use cairo_exec::vm::runners::cairo_runner::CairoRunner;
use cairo_exec::vm::trace::trace_entry::RelocatedTraceEntry;
use felt::Felt252;

// A small addition program, compiled by hand:
//   [ap] = 1000; ap++
//   [ap] = 2000; ap++
//   [ap] = [ap - 2] + [ap - 1]; ap++
//   ret
// with the range_check builtin included and a segment-allocating hint
// attached to the final instruction.
fn program_json() -> String {
    r#"{
        "prime": "0x800000000000011000000000000000000000000000000000000000000000001",
        "builtins": ["range_check"],
        "data": [
            "0x480680017fff8000",
            "0x3e8",
            "0x480680017fff8000",
            "0x7d0",
            "0x48307fff7ffe8000",
            "0x208b7fff7fff7ffe"
        ],
        "identifiers": {
            "__main__.main": {
                "pc": 0,
                "type": "function"
            }
        },
        "hints": {
            "5": [
                {
                    "accessible_scopes": ["__main__", "__main__.main"],
                    "code": "memory[ap] = segments.add()",
                    "flow_tracking_data": {
                        "ap_tracking": {
                            "group": 0,
                            "offset": 0
                        },
                        "reference_ids": {}
                    }
                }
            ]
        },
        "reference_manager": {
            "references": []
        }
    }"#
    .to_string()
}

fn run_program() -> CairoRunner {
    let program = Program::from_reader(program_json().as_bytes(), "main").unwrap();
    let mut runner = CairoRunner::new(&program).unwrap();
    let end = runner.initialize().unwrap();
    let hint_processor = BuiltinHintProcessor::new_empty();
    runner.run_until_pc(end, &hint_processor).unwrap();
    runner.vm.verify_auto_deductions().unwrap();
    runner
}

#[test]
fn program_runs_to_completion() {
    let runner = run_program();
    // One trace entry per executed instruction.
    assert_eq!(runner.vm.get_trace().len(), 4);
    // Three values were appended to the execution segment after the initial
    // stack of (range_check base, return_fp, end).
    assert_eq!(runner.vm.get_ap(), Relocatable::from((1, 6)));
    assert_eq!(
        runner.vm.get_maybe(&Relocatable::from((1, 5))),
        Some(MaybeRelocatable::Int(Felt252::from(3000_u32)))
    );
}

#[test]
fn attached_hint_runs_before_its_instruction() {
    let runner = run_program();
    // The hint at the `ret` wrote a freshly allocated segment base at [ap].
    assert_eq!(
        runner.vm.get_maybe(&Relocatable::from((1, 6))),
        Some(MaybeRelocatable::from(Relocatable::from((5, 0))))
    );
}

#[test]
fn relocated_image_is_flat_and_stable() {
    let mut runner = run_program();
    runner.relocate().unwrap();

    // Segments: program 6, execution 7, range_check 0, return_fp 0, end 0,
    // hint-allocated 1.
    let relocation_table = runner.vm.segments.relocate_segments().unwrap();
    assert_eq!(relocation_table, vec![1, 7, 14, 14, 14, 14]);

    // The first program word and the computed sum, as linear addresses.
    assert_eq!(
        runner.relocated_memory[1],
        Felt252::parse_bytes(b"480680017fff8000", 16)
    );
    assert_eq!(runner.relocated_memory[12], Some(Felt252::from(3000_u32)));

    // First step: pc at the program start, ap and fp above the three-cell
    // initial stack.
    assert_eq!(
        runner.relocated_trace[0],
        RelocatedTraceEntry {
            pc: 1,
            ap: 10,
            fp: 10
        }
    );

    // Two runs of the same program produce identical artifacts.
    let mut second = run_program();
    second.relocate().unwrap();
    assert_eq!(runner.relocated_memory, second.relocated_memory);
    assert_eq!(runner.relocated_trace, second.relocated_trace);
}
