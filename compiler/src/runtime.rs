//! Integer multiply and divide routines appended to every output.
//!
//! Calling convention for both: the caller pushes the right operand, then the
//! left operand, then reserves one result word and branches with `bl`. The
//! routine writes the result into that word and returns with the stack
//! untouched; the caller pops the result and reclaims all three words.

/// `[sp+4] * [sp+8] -> [sp]`, shift-and-add.
pub const MUL: &str = "\
mul\tstmfd\tr13!, {r0-r2, r11, lr}
\tmov\tr11, r13
\tldr\tr1, [r11, #4*6]
\tldr\tr2, [r11, #4*7]
\tmov\tr0, #0
mul_loop\tlsrs\tr2, r2, #1
\taddcs\tr0, r0, r1
\tlsl\tr1, r1, #1
\ttst\tr2, r2
\tbne\tmul_loop
\tstr\tr0, [r11, #4*5]
\tmov\tr13, r11
\tldmfd\tr13!, {r0-r2, r11, pc}
";

/// `[sp+4] / [sp+8] -> [sp]`, truncating towards zero; signs handled apart.
pub const DIV: &str = "\
div\tstmfd\tr13!, {r0-r5, r11, lr}
\tmov\tr11, r13
\tldr\tr1, [r11, #4*9]
\tldr\tr2, [r11, #4*10]
\tmov\tr0, #0
\tmov\tr3, #0
\tcmp\tr1, #0
\trsblt\tr1, r1, #0
\teorlt\tr3, r3, #1
\tcmp\tr2, #0
\trsblt\tr2, r2, #0
\teorlt\tr3, r3, #1
\tmov\tr4, r2
\tmov\tr5, #1
div_max\tlsl\tr4, r4, #1
\tlsl\tr5, r5, #1
\tcmp\tr4, r1
\tble\tdiv_max
div_loop\tlsr\tr4, r4, #1
\tlsr\tr5, r5, #1
\tcmp\tr4, r1
\tbgt\tdiv_loop
\tadd\tr0, r0, r5
\tsub\tr1, r1, r4
\tcmp\tr1, r2
\tbge\tdiv_loop
\tcmp\tr3, #1
\tbne\tdiv_exit
\tcmp\tr1, #0
\taddne\tr0, r0, #1
\trsb\tr0, r0, #0
\trsb\tr1, r1, #0
\taddne\tr1, r1, r2
div_exit\tstr\tr0, [r11, #4*8]
\tmov\tr13, r11
\tldmfd\tr13!, {r0-r5, r11, pc}
";
