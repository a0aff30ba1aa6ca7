//! Decoding a SAT model back into a concrete K-LUT network, simulating
//! it, and rendering it as text or BLIF (spec.md §6).

use crate::encoding::Encoding;
use bcore_sat::SatSolver;
use bcore_truth::{word_count, TruthTableBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSolution {
    /// Fanin object indices, one per slot, in slot order.
    pub fanins: Vec<usize>,
    /// The node's 2^K-entry LUT, indexed by input pattern.
    pub lut: Vec<bool>,
    /// Per-slot literal polarity, only populated in AND-gate-only mode
    /// (empty otherwise); `pol[s]` true means slot `s`'s input is
    /// complemented before the AND.
    pub pol: Vec<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub num_inputs: u32,
    pub lut_size: u32,
    pub nodes: Vec<NodeSolution>,
    pub root_complement: bool,
}

impl Solution {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The root object's own index (`n + node_count - 1`), for naming.
    pub fn root_object(&self) -> usize {
        self.num_inputs as usize + self.nodes.len() - 1
    }

    /// Evaluate the network on every minterm of its `num_inputs` inputs
    /// and return the resulting truth table (spec.md §8 invariant 6/7's
    /// soundness/completeness checks simulate exactly this).
    pub fn simulate(&self) -> TruthTableBuf {
        let n = self.num_inputs;
        let total = 1usize << n;
        let mut values = vec![false; n as usize + self.nodes.len()];
        let mut words = vec![0u64; word_count(n)];

        for m in 0..total {
            for i in 0..n as usize {
                values[i] = (m >> i) & 1 == 1;
            }
            for (idx, node) in self.nodes.iter().enumerate() {
                let mut pattern = 0usize;
                for (s, &fanin) in node.fanins.iter().enumerate() {
                    if values[fanin] {
                        pattern |= 1 << s;
                    }
                }
                values[n as usize + idx] = node.lut[pattern];
            }
            let root_val = values[self.root_object()] ^ self.root_complement;
            if root_val {
                words[m / 64] |= 1u64 << (m % 64);
            }
        }

        TruthTableBuf::from_words(n, words)
    }

    fn object_name(&self, object: usize) -> String {
        if object < self.num_inputs as usize {
            let c = (b'a' + object as u8) as char;
            c.to_string()
        } else {
            let idx = object - self.num_inputs as usize;
            ((b'A' + idx as u8) as char).to_string()
        }
    }

    /// One line per node: `<letter> = <width>'b<bits> <fanins...>`,
    /// followed by the output line `F = <root>` (or `F = !<root>` when
    /// complemented), matching spec.md §6's textual dump convention.
    pub fn format_textual(&self) -> String {
        let width = 1usize << self.lut_size;
        let mut out = String::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let name = self.object_name(self.num_inputs as usize + idx);
            let bits: String = node.lut.iter().rev().map(|&b| if b { '1' } else { '0' }).collect();
            let fanins: Vec<String> = node.fanins.iter().map(|&f| self.object_name(f)).collect();
            out.push_str(&format!("{name} = {width}'b{bits} {}\n", fanins.join(" ")));
        }
        let root_name = self.object_name(self.root_object());
        if self.root_complement {
            out.push_str(&format!("F = !{root_name}\n"));
        } else {
            out.push_str(&format!("F = {root_name}\n"));
        }
        out
    }

    /// A simplified `.blif` rendering: one `.names` stanza per node,
    /// enumerating each on-set cube of its LUT in binary-literal form.
    pub fn format_blif(&self) -> String {
        let mut out = String::new();
        out.push_str(".model exact_synth\n.inputs");
        for i in 0..self.num_inputs as usize {
            out.push(' ');
            out.push_str(&self.object_name(i));
        }
        out.push_str("\n.outputs f\n");

        for (idx, node) in self.nodes.iter().enumerate() {
            let name = self.object_name(self.num_inputs as usize + idx);
            let fanins: Vec<String> = node.fanins.iter().map(|&f| self.object_name(f)).collect();
            out.push_str(&format!(".names {} {}\n", fanins.join(" "), name));
            for (pattern, &value) in node.lut.iter().enumerate() {
                if !value {
                    continue;
                }
                let cube: String = (0..self.lut_size as usize).map(|s| if (pattern >> s) & 1 == 1 { '1' } else { '0' }).collect();
                out.push_str(&format!("{cube} 1\n"));
            }
        }

        let root_name = self.object_name(self.root_object());
        out.push_str(&format!(".names {root_name} f\n"));
        if self.root_complement {
            out.push_str("0 1\n");
        } else {
            out.push_str("1 1\n");
        }
        out.push_str(".end\n");
        out
    }
}

/// Read back the model of a just-solved `solver` into a [`Solution`].
pub fn decode<S: SatSolver>(solver: &S, enc: &Encoding, root_complement: bool) -> Solution {
    let num_patterns = 1usize << enc.k;
    let mut nodes = Vec::with_capacity(enc.node_count);

    for (i, node) in enc.nodes.iter().enumerate() {
        let num_cand = enc.num_candidates(i);
        let mut fanins = Vec::with_capacity(node.conn.len());
        for slot in &node.conn {
            let selected = (0..num_cand)
                .find(|&j| solver.model_value(slot[j]) == Some(true))
                .expect("exactly-one constraint guarantees a selected driver");
            fanins.push(selected);
        }

        let (lut, pol) = if enc.and_gates_only {
            let pol: Vec<bool> = node.pol.iter().map(|&v| solver.model_value(v).unwrap_or(false)).collect();
            let lut = (0..num_patterns)
                .map(|p| (0..enc.k as usize).all(|s| ((p >> s) & 1 == 1) ^ pol[s]))
                .collect();
            (lut, pol)
        } else {
            let mut lut = vec![false; num_patterns];
            for p in 1..num_patterns {
                lut[p] = solver.model_value(node.param[p - 1]).unwrap_or(false);
            }
            (lut, Vec::new())
        };

        nodes.push(NodeSolution { fanins, lut, pol });
    }

    Solution {
        num_inputs: enc.n,
        lut_size: enc.k,
        nodes,
        root_complement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_a_hand_built_and2_node_realizes_conjunction() {
        let sol = Solution {
            num_inputs: 2,
            lut_size: 2,
            nodes: vec![NodeSolution {
                fanins: vec![0, 1],
                lut: vec![false, false, false, true],
                pol: vec![],
            }],
            root_complement: false,
        };
        let tt = sol.simulate();
        assert!(!tt.bit(0));
        assert!(!tt.bit(1));
        assert!(!tt.bit(2));
        assert!(tt.bit(3));
    }

    #[test]
    fn root_complement_inverts_the_simulated_output() {
        let mut sol = Solution {
            num_inputs: 2,
            lut_size: 2,
            nodes: vec![NodeSolution {
                fanins: vec![0, 1],
                lut: vec![false, false, false, true],
                pol: vec![],
            }],
            root_complement: false,
        };
        let direct = sol.simulate();
        sol.root_complement = true;
        let complemented = sol.simulate();
        assert_eq!(direct.not(), complemented);
    }

    #[test]
    fn textual_and_blif_dumps_name_objects_and_the_output() {
        let sol = Solution {
            num_inputs: 2,
            lut_size: 2,
            nodes: vec![NodeSolution {
                fanins: vec![0, 1],
                lut: vec![false, false, false, true],
                pol: vec![],
            }],
            root_complement: false,
        };
        let text = sol.format_textual();
        assert!(text.contains("A = 4'b1000 a b"));
        assert!(text.contains("F = A"));

        let blif = sol.format_blif();
        assert!(blif.contains(".names a b A"));
        assert!(blif.contains(".names A f"));
    }
}
