//! Disassembler for SUBLEQ memory.
//!
//! Every instruction is three consecutive cells, so disassembly is just a
//! matter of grouping bytes in triples.

use crate::cpu::{Memory, OUTPUT_PORT};

/// Format one instruction.
pub fn format_triple(operands: [u8; 3]) -> String {
    let [a, b, c] = operands;
    let note = if b == OUTPUT_PORT { "  ; out" } else { "" };
    format!("subleq 0x{:02x}, 0x{:02x}, 0x{:02x}{}", a, b, c, note)
}

/// Disassemble a program image, three bytes per line.
///
/// A trailing group shorter than three bytes is shown as raw data.
pub fn disassemble(image: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; SUBLEQ Disassembly\n");
    output.push_str("; ------------------\n\n");

    for (i, chunk) in image.chunks(3).enumerate() {
        let addr = i * 3;
        match *chunk {
            [a, b, c] => {
                output.push_str(&format!("0x{:02x}: {}\n", addr, format_triple([a, b, c])));
            }
            _ => {
                let bytes: Vec<String> = chunk.iter().map(|b| format!("0x{:02x}", b)).collect();
                output.push_str(&format!("0x{:02x}: .byte {}\n", addr, bytes.join(", ")));
            }
        }
    }

    output
}

/// Disassemble `count` instructions starting at `addr`, wrapping at the top of memory.
pub fn disassemble_at(mem: &Memory, addr: u8, count: usize) -> Vec<(u8, String)> {
    (0..count)
        .map(|i| {
            let at = addr.wrapping_add((i * 3) as u8);
            let operands = [
                mem.read(at),
                mem.read(at.wrapping_add(1)),
                mem.read(at.wrapping_add(2)),
            ];
            (at, format_triple(operands))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_triple() {
        assert_eq!(format_triple([3, 3, 6]), "subleq 0x03, 0x03, 0x06");
        assert_eq!(format_triple([9, 255, 0]), "subleq 0x09, 0xff, 0x00  ; out");
    }

    #[test]
    fn test_disassemble_trailing_bytes() {
        let text = disassemble(&[3, 3, 6, 253]);
        assert!(text.contains("0x00: subleq 0x03, 0x03, 0x06\n"));
        assert!(text.contains("0x03: .byte 0xfd\n"));
    }

    #[test]
    fn test_disassemble_at_wraps() {
        let mut mem = Memory::new();
        mem.load_image(&[7, 8, 9]);
        mem.write(254, 1);
        mem.write(255, 2);

        let lines = disassemble_at(&mem, 254, 2);

        assert_eq!(lines[0], (254, "subleq 0x01, 0x02, 0x07".to_string()));
        assert_eq!(lines[1].0, 1);
    }
}
