use super::*;

#[test]
fn exit_halts_cleanly() {
    let machine = run_to_halt(code![instr!(MOV, r(R1), imm(0)), instr!(SYSCALL)], 0);
    assert_clean_halt(&machine);
    assert_eq!(ExitStatus::Clean, machine.exit_status());
}

#[test]
fn write_goes_to_stdout() {
    let mut machine = machine_with_data(instr!(SYSCALL), b"ping".to_vec());
    machine.set_register(R1, 1);
    machine.set_register(R2, 1);
    machine.set_register(R3, 1); // start of the data region
    machine.set_register(R4, 4);

    let mut io = TestIo::default();
    machine.step(&mut io);

    assert!(machine.running());
    assert_eq!(4, machine.register(R1));
    assert_eq!(b"ping", &io.output[..]);
    assert!(io.errors.is_empty());
}

#[test]
fn write_to_descriptor_two_goes_to_stderr() {
    let mut machine = machine_with_data(instr!(SYSCALL), b"oops".to_vec());
    machine.set_register(R1, 1);
    machine.set_register(R2, 2);
    machine.set_register(R3, 1);
    machine.set_register(R4, 4);

    let mut io = TestIo::default();
    machine.step(&mut io);

    assert_eq!(b"oops", &io.errors[..]);
    assert!(io.output.is_empty());
}

#[test]
fn write_out_of_bounds_faults_as_read() {
    let mut machine = machine_for(instr!(SYSCALL), 8);
    machine.set_register(R1, 1);
    machine.set_register(R3, 4);
    machine.set_register(R4, 100);

    machine.step(&mut TestIo::default());
    assert_fault(&machine, FLAG_READ_OOB);
}

#[test]
fn read_copies_input_and_stops_at_eof() {
    let mut machine = machine_for(instr!(SYSCALL), 16);
    machine.set_register(R1, 2);
    machine.set_register(R3, 1); // data region starts right after the opcode
    machine.set_register(R4, 8);

    let mut io = TestIo {
        input: b"abc".to_vec(),
        ..TestIo::default()
    };
    machine.step(&mut io);

    assert!(machine.running());
    assert_eq!(3, machine.register(R1));
    assert_eq!(b"abc", &machine.memory()[1..4]);
    assert_eq!(&[0, 0], &machine.memory()[4..6]);
}

#[test]
fn read_from_other_descriptors_returns_zero() {
    let mut machine = machine_for(instr!(SYSCALL), 16);
    machine.set_register(R1, 2);
    machine.set_register(R2, 5);
    machine.set_register(R3, 1);
    machine.set_register(R4, 8);

    let mut io = TestIo {
        input: b"abc".to_vec(),
        ..TestIo::default()
    };
    machine.step(&mut io);

    assert!(machine.running());
    assert_eq!(0, machine.register(R1));
}

#[test]
fn read_out_of_bounds_faults_as_write() {
    let mut machine = machine_for(instr!(SYSCALL), 8);
    machine.set_register(R1, 2);
    machine.set_register(R3, 0xFFFF_FF00);
    machine.set_register(R4, 4);

    machine.step(&mut TestIo::default());
    assert_fault(&machine, FLAG_WRITE_OOB);
}

#[test]
fn open_is_a_stub() {
    exec! {
        instr!(SYSCALL),
        [R1 = 3] => [R1 = 0xFFFF_FFFFu32],
        steps: 1, running: true, ip: 1
    };
}

#[test]
fn unknown_syscall_faults() {
    let mut machine = machine_for(instr!(SYSCALL), 0);
    machine.set_register(R1, 9);
    machine.step(&mut TestIo::default());
    assert_fault(&machine, FLAG_BAD_INSTR);
}
