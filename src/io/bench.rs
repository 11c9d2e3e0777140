//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read, Write};

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::{Gate, Network, Signal};

use super::utils::{get_inverted_signals, sig_to_string};

fn build_name_to_sig(
    statements: &[Vec<String>],
    inputs: &[String],
) -> FxHashMap<String, Signal> {
    let mut ret = FxHashMap::default();
    for (i, name) in inputs.iter().enumerate() {
        let present = ret
            .insert(name.clone(), Signal::from_input(i as u32))
            .is_some();
        assert!(!present, "{} is defined twice", name)
    }
    for (i, s) in statements.iter().enumerate() {
        let present = ret.insert(s[0].clone(), Signal::from_var(i as u32)).is_some();
        assert!(!present, "{} is defined twice", s[0])
    }

    // ABC-style naming for constant signals
    if !ret.contains_key("vdd") {
        ret.insert("vdd".to_string(), Signal::one());
    }
    if !ret.contains_key("gnd") {
        ret.insert("gnd".to_string(), Signal::zero());
    }
    ret
}

fn gate_dependencies(
    statement: &[String],
    name_to_sig: &FxHashMap<String, Signal>,
) -> Result<Vec<Signal>, String> {
    statement[2..]
        .iter()
        .map(|n| {
            name_to_sig
                .get(n)
                .copied()
                .ok_or_else(|| format!("Gate input {n} is not generated anywhere"))
        })
        .collect()
}

fn network_from_statements(
    statements: &[Vec<String>],
    inputs: &[String],
    outputs: &[String],
) -> Result<Network, String> {
    let mut ret = Network::new();
    ret.add_inputs(inputs.len());

    // Compute a mapping between the names and the signals
    let name_to_sig = build_name_to_sig(statements, inputs);

    // One node per statement upfront, so statements may reference each other
    // in any order; each is replaced by its actual function below
    for _ in statements {
        ret.add(Gate::Buf(Signal::zero()));
    }

    for (i, s) in statements.iter().enumerate() {
        let sigs = gate_dependencies(s, &name_to_sig)?;
        let tpe = s[1].to_uppercase();
        let sig = match tpe.as_str() {
            "AND" => ret.and_n(&sigs),
            "NAND" => !ret.and_n(&sigs),
            "OR" => ret.or_n(&sigs),
            "NOR" => !ret.or_n(&sigs),
            "XOR" => ret.xor_n(&sigs),
            "XNOR" => !ret.xor_n(&sigs),
            "BUF" | "BUFF" => {
                assert_eq!(sigs.len(), 1);
                sigs[0]
            }
            "NOT" => {
                assert_eq!(sigs.len(), 1);
                !sigs[0]
            }
            "VDD" => Signal::one(),
            "VSS" | "GND" => Signal::zero(),
            "MUX" => {
                assert_eq!(sigs.len(), 3);
                ret.mux(sigs[0], sigs[1], sigs[2])
            }
            "MAJ" => {
                assert_eq!(sigs.len(), 3);
                ret.maj(sigs[0], sigs[1], sigs[2])
            }
            _ => {
                return Err(format!(
                    "Unsupported gate type {} for an And-Inverter Graph",
                    s[1]
                ));
            }
        };
        ret.replace(i, Gate::Buf(sig));
    }
    for o in outputs {
        let s = name_to_sig
            .get(o)
            .copied()
            .ok_or_else(|| format!("Output {o} is not generated anywhere"))?;
        ret.add_output(s);
    }
    ret.topo_sort();
    ret.check();
    Ok(ret)
}

/// Read a network in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     x7 = gnd
///     x8 = vdd
///     OUTPUT(x0)
/// ```
///
/// Gates that are not 2-input Ands are decomposed into And trees while
/// loading; sequential elements are rejected.
pub fn read_bench<R: Read>(r: R) -> Result<Network, String> {
    let mut statements = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for l in BufReader::new(r).lines() {
        if let Ok(s) = l {
            let t = s.trim().to_owned();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            if !t.contains('=') {
                let parts: Vec<_> = t
                    .split(&['(', ')'])
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                assert_eq!(parts.len(), 2);
                if ["INPUT", "PINPUT"].contains(&parts[0]) {
                    inputs.push(parts[1].to_string());
                } else if ["OUTPUT", "POUTPUT"].contains(&parts[0]) {
                    outputs.push(parts[1].to_string());
                } else {
                    return Err(format!("Unknown keyword {}", parts[0]));
                }
            } else {
                let parts: Vec<_> = t
                    .split(&['=', '(', ',', ')'])
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect();
                assert!(parts.len() >= 2);
                statements.push(parts);
            }
        } else {
            return Err("Error during file IO".to_string());
        }
    }
    network_from_statements(&statements, &inputs, &outputs)
}

/// Write a network in .bench format, as used by the ISCAS benchmarks
///
/// Inverted signals are exported through `_n` aliases defined with NOT
/// statements at the end of the file.
pub fn write_bench<W: Write>(w: &mut W, aig: &Network) {
    writeln!(w, "# .bench (ISCAS) file").unwrap();
    writeln!(w, "# Generated by rebal").unwrap();
    for i in 0..aig.nb_inputs() {
        writeln!(w, "INPUT({})", aig.input(i)).unwrap();
    }
    writeln!(w).unwrap();
    for i in 0..aig.nb_outputs() {
        writeln!(w, "OUTPUT({})", sig_to_string(&aig.output(i))).unwrap();
    }
    writeln!(w).unwrap();
    for i in 0..aig.nb_nodes() {
        let g = aig.gate(i);
        let rep = g.dependencies().iter().map(sig_to_string).join(", ");
        write!(w, "x{} = ", i).unwrap();
        match g {
            Gate::And(_) => {
                writeln!(w, "AND({})", rep).unwrap();
            }
            Gate::Buf(s) => {
                if s.is_constant() {
                    writeln!(w, "{}", sig_to_string(s)).unwrap();
                } else if s.is_inverted() {
                    writeln!(w, "NOT({})", sig_to_string(&!s)).unwrap();
                } else {
                    writeln!(w, "BUF({})", rep).unwrap();
                }
            }
        }
    }

    let signals_with_inv = get_inverted_signals(aig);
    for s in signals_with_inv {
        writeln!(w, "{}_n = NOT({})", s, s).unwrap();
    }
}
