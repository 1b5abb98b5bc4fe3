use std::error::Error;

use emu::decode::decode_table;
use emu::{Instruction, Mau, Opcode, SerialHost};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: mau [--log-file] <command>

commands:
  table                      list every opcode with its control word
  run <OP> <A1> <A2> <B1> <B2>
                             run one instruction, operands are 0..=15 (decimal or 0x..)
  demo                       run the reference instructions

RUST_LOG controls the log filter (default: warn).";

fn main() -> Result<(), Box<dyn Error>> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let log_to_file = take_flag(&mut args, "--log-file");
    let _guard = init_tracing(log_to_file)?;

    match args.first().map(String::as_str) {
        Some("table") => print_table(),
        Some("run") => {
            let instruction = parse_instruction(&args[1..])?;
            let mut host = SerialHost::new(Mau::new());
            print_transaction(&mut host, instruction)?;
        }
        Some("demo") => demo()?,
        Some(command) => {
            tracing::warn!("unknown command `{command}`");
            println!("{USAGE}");
        }
        None => println!("{USAGE}"),
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

/// Installs the global subscriber. When logging to a file the returned guard
/// must live until the end of `main` so buffered lines get flushed.
fn init_tracing(log_to_file: bool) -> Result<Option<WorkerGuard>, Box<dyn Error>> {
    let filter = EnvFilter::from_default_env().add_directive("warn".parse()?);

    if !log_to_file {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let dir = std::env::temp_dir();
    let appender = tracing_appender::rolling::never(&dir, "mau.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    println!("logging to {}", dir.join("mau.log").display());
    Ok(Some(guard))
}

fn parse_operand(text: &str) -> Result<u8, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| format!("invalid operand `{text}`"))
}

fn parse_instruction(args: &[String]) -> Result<Instruction, Box<dyn Error>> {
    let [op, a1, a2, b1, b2] = args else {
        return Err(format!("expected an opcode and four operands\n\n{USAGE}").into());
    };

    let opcode: Opcode = op.parse()?;
    let instruction = Instruction::from_operands(
        opcode,
        parse_operand(a1)?,
        parse_operand(a2)?,
        parse_operand(b1)?,
        parse_operand(b2)?,
    )?;
    Ok(instruction)
}

fn print_table() {
    println!("{:<4} {:<7} {:<17} {:>6}", "hex", "op", "control", "packed");
    for (opcode, control) in decode_table() {
        println!(
            "0x{}  {:<7} {control} 0x{:04X}",
            opcode.nibble(),
            opcode.mnemonic(),
            control.bits()
        );
    }
}

fn print_transaction(host: &mut SerialHost, instruction: Instruction) -> Result<(), Box<dyn Error>> {
    let readback = host.transact(instruction)?;
    tracing::info!(
        "{instruction} done at tick {}, result {}",
        host.mau().ticks(),
        readback.result.value
    );
    let nibbles: Vec<String> = readback.nibbles.iter().map(ToString::to_string).collect();

    println!(
        "{instruction:<28} -> {:>4} (0x{:03X}) carry {} | tx [{}] 0x{:05X}",
        readback.result.value,
        readback.result.value,
        u8::from(readback.result.carry),
        nibbles.join(" "),
        instruction.to_bits()
    );
    Ok(())
}

fn demo() -> Result<(), Box<dyn Error>> {
    let mut host = SerialHost::new(Mau::new());
    let program = [
        (Opcode::Dot2, [3, 2, 1, 4]),
        (Opcode::Vadd2, [5, 3, 2, 7]),
        (Opcode::Vsub2, [5, 2, 9, 4]),
        (Opcode::Dist2, [5, 2, 9, 6]),
        (Opcode::Diff2, [4, 3, 2, 1]),
        (Opcode::Diff2, [1, 1, 2, 2]),
        (Opcode::Noop, [0, 0xA, 0, 0xB]),
        (Opcode::LerpX, [4, 3, 9, 2]),
    ];

    tracing::info!("demo: {} instructions", program.len());
    for (opcode, [a1, a2, b1, b2]) in program {
        let instruction = Instruction::from_operands(opcode, a1, a2, b1, b2)?;
        print_transaction(&mut host, instruction)?;
    }

    println!("\n{} ticks", host.mau().ticks());
    Ok(())
}
