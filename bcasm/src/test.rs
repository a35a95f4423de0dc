use super::*;
use bvmfile::Module;


fn assemble_ok(src: &str) -> Module {
    match assemble(src) {
        Ok(module) => module,
        Err(err) => panic!("assembly failed: {}", err),
    }
}

fn assert_error(src: &str, kind: ErrorKind, line: usize) {
    let err = assemble(src).unwrap_err();
    assert_eq!(kind, err.kind(), "error was: {}", err);
    assert_eq!(line, err.line(), "error was: {}", err);
}

#[test]
fn empty_source_produces_an_empty_module() {
    let module = assemble_ok("");
    assert_eq!(0, module.entry_point());
    assert!(module.code().is_empty());
    assert!(module.data().is_empty());
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let module = assemble_ok("; leading comment\n\n_main:\n  nop ; trailing\n# hash comment\n");
    assert_eq!(&[0x00], module.code());
}

#[test]
fn missing_trailing_newline_is_fine() {
    let module = assemble_ok("_main:\nnop");
    assert_eq!(&[0x00], module.code());
}

#[test]
fn immediate_move_encoding() {
    let module = assemble_ok("_main:\n mov r3, 0xDEADBEEF\n");
    assert_eq!(&[0x01, 0x12, 0x02, 0xEF, 0xBE, 0xAD, 0xDE], module.code());
}

#[test]
fn mnemonics_and_registers_are_case_insensitive() {
    let upper = assemble_ok("_main:\nMOV R3, 1\n");
    let lower = assemble_ok("_main:\nmov r3, 1\n");
    assert_eq!(upper, lower);
}

#[test]
fn hex_prefix_is_case_insensitive() {
    let module = assemble_ok("_main:\n mov r1, 0X10\n");
    assert_eq!(&[0x01, 0x12, 0x00, 0x10, 0x00, 0x00, 0x00], module.code());
}

#[test]
fn negative_decimal_wraps_to_twos_complement() {
    let module = assemble_ok("_main:\n mov r1, -1\n");
    assert_eq!(&[0x01, 0x12, 0x00, 0xFF, 0xFF, 0xFF, 0xFF], module.code());
}

#[test]
fn overlong_literals_wrap_modulo_32_bits() {
    let module = assemble_ok("_main:\n mov r1, 4294967297\n");
    assert_eq!(&[0x01, 0x12, 0x00, 0x01, 0x00, 0x00, 0x00], module.code());
}

#[test]
fn bare_instructions_are_single_bytes() {
    let module = assemble_ok("_main:\n nop\n syscall\n");
    assert_eq!(&[0x00, 0x0B], module.code());
}

#[test]
fn labels_resolve_to_code_offsets() {
    let module = assemble_ok("_main:\nstart:\n mov r1, 1\n jmp start\n");
    assert_eq!(13, module.code_size());
    assert_eq!(&[0x06, 0x02, 0, 0, 0, 0], &module.code()[7..13]);
}

#[test]
fn forward_references_resolve() {
    let module = assemble_ok("_main:\n jmp end\n nop\nend:\n nop\n");
    assert_eq!(&[0x06, 0x02, 7, 0, 0, 0], &module.code()[..6]);
}

#[test]
fn data_names_resolve_to_absolute_addresses() {
    let src = "_main:\n mov r1, [buf]\n_data:\n DB pad[4]\n DB buf[4]\n";
    let module = assemble_ok(src);
    // code is 7 bytes, so pad sits at 7 and buf at 11
    assert_eq!(8, module.data_size());
    assert_eq!(&[0x01, 0x13, 0x00, 11, 0, 0, 0], module.code());
}

#[test]
fn data_symbols_work_as_immediates() {
    let src = "_main:\n mov r1, buf\n_data:\n DB buf[4]\n";
    let module = assemble_ok(src);
    assert_eq!(&[0x01, 0x12, 0x00, 7, 0, 0, 0], module.code());
}

#[test]
fn numeric_memory_operands_are_absolute_addresses() {
    let module = assemble_ok("_main:\n mov [0x20], r1\n");
    assert_eq!(&[0x01, 0x31, 0x20, 0x00, 0x00, 0x00, 0x00], module.code());
}

#[test]
fn data_region_is_zero_filled() {
    let module = assemble_ok("_data:\n DB buf[6]\n");
    assert_eq!(0, module.code_size());
    assert_eq!(&[0, 0, 0, 0, 0, 0], module.data());
}

#[test]
fn db_size_accepts_hex() {
    let module = assemble_ok("_data:\n DB buf[0x10]\n");
    assert_eq!(16, module.data_size());
}

#[test]
fn sections_can_be_reentered() {
    let module = assemble_ok("_main:\n nop\n_data:\n DB b[4]\n_main:\n syscall\n");
    assert_eq!(&[0x00, 0x0B], module.code());
    assert_eq!(4, module.data_size());
}

#[test]
fn pass_one_sizing_matches_emission() {
    let src = "_main:\n nop\n mov r1, 2\n mov [0x40], r2\n add r3, [0x40]\n cmp r3, r4\n jeq done\ndone:\n syscall\n";
    let module = assemble_ok(src);
    // 1 + 7 + 7 + 7 + 4 + 6 + 1 bytes
    assert_eq!(33, module.code_size());
    // `done` binds to the syscall's offset
    assert_eq!(&[0x07, 0x02, 32, 0, 0, 0], &module.code()[26..32]);
    assert_eq!(0x0B, module.code()[32]);
}

#[test]
fn entry_point_is_always_code_start() {
    let module = assemble_ok("_main:\nmain:\n nop\n");
    assert_eq!(0, module.entry_point());
}

#[test]
fn content_before_a_section_header_is_rejected() {
    assert_error("nop\n", ErrorKind::BadSection, 1);
    assert_error("L:\n_main:\n nop\n", ErrorKind::BadSection, 1);
}

#[test]
fn unknown_mnemonics_are_rejected() {
    assert_error("_main:\n frobnicate r1\n", ErrorKind::UnknownOpcode, 2);
}

#[test]
fn operand_counts_are_checked() {
    assert_error("_main:\n nop r1\n", ErrorKind::BadOperandCount, 2);
    assert_error("_main:\n syscall r1\n", ErrorKind::BadOperandCount, 2);
    assert_error("_main:\n mov r1\n", ErrorKind::BadOperandCount, 2);
    assert_error("_main:\n jmp\n", ErrorKind::BadOperandCount, 2);
    assert_error("_main:\n jmp a, b\n", ErrorKind::BadOperandCount, 2);
}

#[test]
fn branch_targets_cannot_be_memory_operands() {
    assert_error("_main:\n jmp [8]\n", ErrorKind::BadOperandShape, 2);
    assert_error("_main:\n jeq [somewhere]\n", ErrorKind::BadOperandShape, 2);
}

#[test]
fn mov_destination_shape_is_checked() {
    assert_error("_main:\n mov 5, r1\n", ErrorKind::BadOperandShape, 2);
    assert_error("_main:\n mov [a], [b]\n", ErrorKind::BadOperandShape, 2);
}

#[test]
fn arithmetic_destinations_must_be_registers() {
    assert_error("_main:\n add [a], r1\n", ErrorKind::BadOperandShape, 2);
    assert_error("_main:\n sub 1, 2\n", ErrorKind::BadOperandShape, 2);
    assert_error("_main:\n xor [0x10], 1\n", ErrorKind::BadOperandShape, 2);
}

#[test]
fn cmp_first_operand_must_be_a_register() {
    assert_error("_main:\n cmp 1, r1\n", ErrorKind::BadOperandShape, 2);
}

#[test]
fn duplicate_label_reports_the_second_declaration() {
    assert_error("_main:\nL:\n nop\nL:\n nop\n", ErrorKind::DuplicateLabel, 4);
}

#[test]
fn duplicate_data_names_are_rejected() {
    assert_error("_data:\n DB a[4]\n DB a[4]\n", ErrorKind::DuplicateData, 3);
}

#[test]
fn namespaces_are_shared_between_labels_and_data() {
    assert_error(
        "_main:\nbuf:\n nop\n_data:\n DB buf[4]\n",
        ErrorKind::DuplicateData,
        5,
    );
    assert_error(
        "_data:\n DB buf[4]\n_main:\nbuf:\n nop\n",
        ErrorKind::DuplicateLabel,
        4,
    );
}

#[test]
fn empty_labels_are_rejected() {
    assert_error("_main:\n:\n", ErrorKind::EmptyLabel, 2);
}

#[test]
fn db_outside_the_data_section_is_rejected() {
    assert_error("_main:\n DB buf[4]\n", ErrorKind::UnknownOpcode, 2);
}

#[test]
fn only_db_lines_are_allowed_in_data() {
    assert_error("_data:\n nop\n", ErrorKind::MalformedDb, 2);
    assert_error("_data:\nx:\n", ErrorKind::MalformedDb, 2);
}

#[test]
fn negative_data_sizes_are_rejected() {
    assert_error("_data:\n DB buf[-1]\n", ErrorKind::BadNumber, 2);
}

#[test]
fn unknown_symbols_are_reported_with_their_line() {
    assert_error("_main:\n jmp nowhere\n", ErrorKind::UnknownSymbol, 2);
    assert_error("_main:\n nop\n mov r1, [nothing]\n", ErrorKind::UnknownSymbol, 3);
}

#[test]
fn registers_do_not_resolve_as_symbols_inside_brackets() {
    assert_error("_main:\n mov r1, [r2]\n", ErrorKind::UnknownSymbol, 2);
}

#[test]
fn garbled_lines_are_syntax_errors() {
    assert_error("_main:\n mov r1 5\n", ErrorKind::Syntax, 2);
}
