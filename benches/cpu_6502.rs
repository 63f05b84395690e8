use atari2600_core::{Cpu, Memory6502};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Flat 64 KiB memory for benchmarking the CPU in isolation, outside the
/// Atari 2600's 13-bit mirrored address space.
struct BenchMemory {
    ram: Vec<u8>,
}

impl BenchMemory {
    fn new() -> Self {
        let mut ram = vec![0u8; 0x10000];

        ram[0xFFFC] = 0x00;
        ram[0xFFFD] = 0x80;

        // LDA #$42
        ram[0x8000] = 0xA9;
        ram[0x8001] = 0x42;
        // STA $2000
        ram[0x8002] = 0x8D;
        ram[0x8003] = 0x00;
        ram[0x8004] = 0x20;
        // LDX #$10
        ram[0x8005] = 0xA2;
        ram[0x8006] = 0x10;
        // LDY #$20
        ram[0x8007] = 0xA0;
        ram[0x8008] = 0x20;
        // INX
        ram[0x8009] = 0xE8;
        // INY
        ram[0x800A] = 0xC8;
        // DEX
        ram[0x800B] = 0xCA;
        // DEY
        ram[0x800C] = 0x88;
        // ADC #$01
        ram[0x800D] = 0x69;
        ram[0x800E] = 0x01;
        // JMP $8000
        ram[0x800F] = 0x4C;
        ram[0x8010] = 0x00;
        ram[0x8011] = 0x80;

        Self { ram }
    }
}

impl Memory6502 for BenchMemory {
    fn read(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.ram[addr as usize] = val;
    }
}

fn bench_cpu_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_step");

    group.bench_function("single_instruction", |b| {
        b.iter(|| {
            let mut cpu = Cpu::new(BenchMemory::new());
            cpu.exec_one().unwrap(); // reset
            cpu.exec_one().unwrap();
            black_box(cpu.a);
        });
    });

    group.finish();
}

fn bench_cpu_multiple_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_multiple_steps");

    for step_count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(step_count), step_count, |b, &count| {
            b.iter(|| {
                let mut cpu = Cpu::new(BenchMemory::new());
                cpu.exec_one().unwrap(); // reset
                for _ in 0..count {
                    cpu.exec_one().unwrap();
                }
                black_box(cpu.cycle_count);
            });
        });
    }

    group.finish();
}

fn bench_cpu_addressing_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_addressing");

    group.bench_function("immediate_mode", |b| {
        b.iter(|| {
            let mut cpu = Cpu::new(BenchMemory::new());
            cpu.exec_one().unwrap(); // reset
            for _ in 0..100 {
                cpu.exec_one().unwrap();
            }
            black_box(cpu.a);
        });
    });

    group.finish();
}

fn bench_cpu_reset(c: &mut Criterion) {
    c.bench_function("cpu_6502_reset", |b| {
        let mut cpu = Cpu::new(BenchMemory::new());
        b.iter(|| {
            cpu.reset();
            cpu.exec_one().unwrap();
            black_box(cpu.pc);
        });
    });
}

criterion_group!(benches, bench_cpu_step, bench_cpu_multiple_steps, bench_cpu_addressing_modes, bench_cpu_reset);
criterion_main!(benches);
