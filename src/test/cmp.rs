use super::*;

fn compare_flags(machine: &Machine) -> Word {
    machine.flags() & COMPARE_MASK
}

#[test]
fn equal_sets_only_eq() {
    let machine = exec! {
        instr!(CMP, r(R1), r(R2)),
        [R1 = 5, R2 = 5] => [],
        steps: 1, running: true, ip: 4
    };
    assert_eq!(FLAG_EQ, compare_flags(&machine));
}

#[test]
fn greater_sets_only_gt() {
    let machine = exec! {
        instr!(CMP, r(R1), imm(3)),
        [R1 = 7] => [],
        steps: 1, running: true, ip: 7
    };
    assert_eq!(FLAG_GT, compare_flags(&machine));
}

#[test]
fn less_sets_only_lt() {
    let machine = exec! {
        instr!(CMP, r(R1), imm(7)),
        [R1 = 3] => [],
        steps: 1, running: true, ip: 7
    };
    assert_eq!(FLAG_LT, compare_flags(&machine));
}

#[test]
fn comparison_is_unsigned_by_default() {
    let machine = exec! {
        instr!(CMP, r(R1), r(R2)),
        [R1 = 0xFFFF_FFFFu32, R2 = 1] => [],
        steps: 1, running: true, ip: 4
    };
    assert_eq!(FLAG_GT, compare_flags(&machine));
}

#[test]
fn sign_mode_compares_signed() {
    let machine = exec! {
        instr!(CMP, r(R1), r(R2)),
        [RS = 1, R1 = 0xFFFF_FFFFu32, R2 = 1] => [],
        steps: 1, running: true, ip: 4
    };
    assert_eq!(FLAG_LT, compare_flags(&machine));
}

#[test]
fn memory_source() {
    let code = code![
        instr!(MOV, mem(32), imm(9)),
        instr!(CMP, r(R1), mem(32)),
    ];
    let machine = exec! {
        code,
        [R1 = 9] => [],
        steps: 2, running: true, ip: 17
    };
    assert_eq!(FLAG_EQ, compare_flags(&machine));
}

#[test]
fn stale_compare_bits_are_replaced() {
    let machine = exec! {
        instr!(CMP, r(R1), r(R2)),
        [RF = FLAG_GT | FLAG_LT, R1 = 4, R2 = 4] => [],
        steps: 1, running: true, ip: 4
    };
    assert_eq!(FLAG_EQ, compare_flags(&machine));
}

#[test]
fn reserved_flag_bits_are_preserved() {
    let machine = exec! {
        instr!(CMP, r(R1), imm(1)),
        [RF = 0x0000_0100u32] => [],
        steps: 1, running: true, ip: 7
    };
    assert_eq!(0x0000_0100 | FLAG_LT, machine.flags());
}

#[test]
fn first_operand_must_be_register() {
    let machine = run_to_halt(instr!(CMP, imm(1), imm(2)), 64);
    assert_fault(&machine, FLAG_BAD_INSTR);
}
