mod common;

use std::io::Write;

use common::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sim_lib::error::LoadError;
use sim_lib::error::SimulatorError;
use sim_lib::instruction::Instruction;
use sim_lib::instruction::InstructionClass;
use sim_lib::instruction::Opcode;
use sim_lib::loader::load_program;
use sim_lib::loader::parse_program;

#[test]
fn test_operand_layout() {
    let program = program(
        "ADD R1 R2 R3\nADDI R4 R5 -7\nLW R6 8(R7)\nSW R8 0x10(R9)\nEOP\n",
    );
    assert_eq!(
        program.instructions,
        vec![
            Instruction {
                opcode: Opcode::Add,
                dest: Some(1),
                src1: Some(2),
                src2: Some(3),
                immediate: None,
            },
            Instruction {
                opcode: Opcode::Addi,
                dest: Some(4),
                src1: Some(5),
                src2: None,
                immediate: Some(-7),
            },
            Instruction {
                opcode: Opcode::Lw,
                dest: Some(6),
                src1: Some(7),
                src2: None,
                immediate: Some(8),
            },
            Instruction {
                opcode: Opcode::Sw,
                dest: None,
                src1: Some(9),
                src2: Some(8),
                immediate: Some(16),
            },
            Instruction { opcode: Opcode::Eop, ..Instruction::nop() },
        ]
    );
}

#[test]
fn test_branch_offsets() {
    let countdown = program(COUNTDOWN);
    assert_eq!(countdown.labels.get("LOOP"), Some(&1));
    let branch = countdown.instructions[2];
    assert_eq!(branch.opcode, Opcode::Bnez);
    assert_eq!(branch.src1, Some(1));
    assert_eq!(branch.immediate, Some(-8));

    let jump = program(JUMP_OVER).instructions[1];
    assert_eq!(jump.opcode, Opcode::Jump);
    assert_eq!(jump.src1, None);
    assert_eq!(jump.immediate, Some(4));
}

#[test]
fn test_labels_comments_and_blank_lines() {
    let source = "\
// countdown
START:
    ADDI R1 R0 3   // three rounds

LOOP: SUBI R1 R1 1
      BNEZ R1 LOOP
      BEQZ R0 END
END:
";
    let program = program(source);
    assert_eq!(program.len(), 4);
    assert_eq!(program.labels.get("START"), Some(&0));
    assert_eq!(program.labels.get("LOOP"), Some(&1));
    // A trailing label points one past the last instruction
    assert_eq!(program.labels.get("END"), Some(&4));
    assert_eq!(program.instructions[3].immediate, Some(0));
    assert_eq!(program.fetch(4), Instruction::nop());
}

#[rstest]
#[case::unknown_opcode("MUL R1 R2 R3\n", 1)]
#[case::lowercase_opcode("EOP\nadd R1 R2 R3\n", 2)]
fn test_unknown_opcode(#[case] source: &str, #[case] expected_line: usize) {
    match parse_program(source) {
        Err(LoadError::UnknownOpcode { line, .. }) => {
            assert_eq!(line, expected_line)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_operand_errors() {
    assert!(matches!(
        parse_program("ADD R1 R2\n"),
        Err(LoadError::MissingOperand { line: 1, .. })
    ));
    assert!(matches!(
        parse_program("EOP\nADDI R1 R2 five\n"),
        Err(LoadError::MalformedOperand { line: 2, .. })
    ));
    assert!(matches!(
        parse_program("LW R1 8[R2]\n"),
        Err(LoadError::MalformedOperand { line: 1, .. })
    ));
    assert!(matches!(
        parse_program("ADD R1 R2 R32\n"),
        Err(LoadError::RegisterOutOfRange { line: 1, index: 32 })
    ));
    assert!(matches!(
        parse_program("SW R1 0(R40)\n"),
        Err(LoadError::RegisterOutOfRange { line: 1, index: 40 })
    ));
}

#[test]
fn test_label_errors() {
    assert!(matches!(
        parse_program("BEQZ R1 NOWHERE\nEOP\n"),
        Err(LoadError::UndefinedLabel { line: 1, .. })
    ));
    assert!(matches!(
        parse_program("A: NOP\nA: EOP\n"),
        Err(LoadError::DuplicateLabel { line: 2, .. })
    ));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STORE_LOAD.as_bytes()).unwrap();
    let program = load_program(file.path()).unwrap();
    assert_eq!(program.len(), 3);
    assert_eq!(program.instructions[1].opcode, Opcode::Lw);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_program(dir.path().join("missing.s"));
    assert!(matches!(
        result,
        Err(SimulatorError::LoadError(LoadError::FileReadError(..)))
    ));
}

#[test]
fn test_classification() {
    use InstructionClass::*;
    let expected = [
        (Opcode::Lw, Memory),
        (Opcode::Sw, Memory),
        (Opcode::Add, RegisterOp),
        (Opcode::Addi, ImmediateOp),
        (Opcode::Sub, RegisterOp),
        (Opcode::Subi, ImmediateOp),
        (Opcode::Xor, RegisterOp),
        (Opcode::Beqz, Branch),
        (Opcode::Bnez, Branch),
        (Opcode::Bltz, Branch),
        (Opcode::Bgtz, Branch),
        (Opcode::Blez, Branch),
        (Opcode::Bgez, Branch),
        (Opcode::Jump, Branch),
        (Opcode::Eop, EndOfProgram),
        (Opcode::Nop, NoOp),
    ];
    for (opcode, class) in expected {
        assert_eq!(opcode.class(), class, "{}", opcode);
        assert_eq!(opcode.mnemonic().parse::<Opcode>(), Ok(opcode));
    }
}

#[test]
fn test_display() {
    let program = program("LOOP: LW R1 -4(R2)\nBNEZ R1 LOOP\nSW R1 0(R0)\n");
    let text: Vec<String> =
        program.instructions.iter().map(ToString::to_string).collect();
    assert_eq!(text, vec!["LW R1 -4(R2)", "BNEZ R1 -8", "SW R1 0(R0)"]);
}
