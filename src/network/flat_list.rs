//! Flat instruction lists, an append-only alternative to [`Network`]
//!
//! Literals are numbered as signals: node 0 is the constant, nodes `1..=nb_inputs` are the inputs,
//! then one node per instruction. Nothing is hashed or simplified, so every call adds an instruction.
//!
//! ```
//! # use supergate::network::FlatList;
//! let mut list = FlatList::new(2);
//! let a = list.input(0);
//! let b = list.input(1);
//! let x = list.add_xor(a, b);
//! list.add_output(!x);
//! let encoded = list.encode();
//! assert_eq!(FlatList::decode(&encoded), Ok(list));
//! ```

use std::fmt;

use crate::sim::{signal_value, SimulationValue};
use crate::{Gate, Network, Signal};

/// Operation of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// 2-input And
    And,
    /// 2-input Xor
    Xor,
    /// Majority
    Maj,
}

impl Opcode {
    /// Number of fanins of the operation
    pub fn arity(&self) -> usize {
        match self {
            Opcode::And | Opcode::Xor => 2,
            Opcode::Maj => 3,
        }
    }

    fn code(&self) -> u32 {
        match self {
            Opcode::And => 0,
            Opcode::Xor => 1,
            Opcode::Maj => 2,
        }
    }

    fn from_code(c: u32) -> Option<Opcode> {
        match c {
            0 => Some(Opcode::And),
            1 => Some(Opcode::Xor),
            2 => Some(Opcode::Maj),
            _ => None,
        }
    }
}

/// A single instruction: an operation and its fanin literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    fanins: [Signal; 3],
}

impl Instruction {
    /// Operation of the instruction
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Fanin literals of the instruction
    pub fn fanins(&self) -> &[Signal] {
        &self.fanins[..self.opcode.arity()]
    }

    /// Equivalent gate, with literals as node indices
    pub fn gate(&self) -> Gate {
        let [a, b, c] = self.fanins;
        match self.opcode {
            Opcode::And => Gate::and(a, b),
            Opcode::Xor => Gate::xor(a, b),
            Opcode::Maj => Gate::maj(a, b, c),
        }
    }
}

/// A list of instructions over a fixed number of inputs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatList {
    nb_inputs: usize,
    instructions: Vec<Instruction>,
    outputs: Vec<Signal>,
}

impl FlatList {
    /// Create an empty list with the given number of inputs
    pub fn new(nb_inputs: usize) -> FlatList {
        FlatList {
            nb_inputs,
            instructions: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Return the number of inputs
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Return the number of instructions
    pub fn nb_instructions(&self) -> usize {
        self.instructions.len()
    }

    /// Return the number of outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Get the literal of input i
    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.nb_inputs);
        Signal::from_node(i as u32 + 1)
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        self.outputs[i]
    }

    /// Get the instruction at index i
    pub fn instruction(&self, i: usize) -> &Instruction {
        &self.instructions[i]
    }

    fn nb_literals(&self) -> usize {
        1 + self.nb_inputs + self.instructions.len()
    }

    fn push(&mut self, opcode: Opcode, fanins: [Signal; 3]) -> Signal {
        for s in &fanins[..opcode.arity()] {
            assert!(s.index() < self.nb_literals(), "Undefined literal {s}");
        }
        let s = Signal::from_node(self.nb_literals() as u32);
        self.instructions.push(Instruction { opcode, fanins });
        s
    }

    /// Append an And instruction
    pub fn add_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.push(Opcode::And, [a, b, Signal::zero()])
    }

    /// Append a Xor instruction
    pub fn add_xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.push(Opcode::Xor, [a, b, Signal::zero()])
    }

    /// Append a Maj instruction
    pub fn add_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        self.push(Opcode::Maj, [a, b, c])
    }

    /// Add an output and return its index
    pub fn add_output(&mut self, s: Signal) -> usize {
        assert!(s.index() < self.nb_literals(), "Undefined literal {s}");
        self.outputs.push(s);
        self.outputs.len() - 1
    }

    /// Serialize the list to a stream of words
    ///
    /// The header holds the number of inputs, instructions and outputs. Each instruction is
    /// its opcode followed by its fanin literals, and the outputs come last.
    pub fn encode(&self) -> Vec<u32> {
        let mut ret = vec![
            self.nb_inputs as u32,
            self.instructions.len() as u32,
            self.outputs.len() as u32,
        ];
        for inst in self.instructions.iter() {
            ret.push(inst.opcode.code());
            ret.extend(inst.fanins().iter().map(|s| s.raw()));
        }
        ret.extend(self.outputs.iter().map(|s| s.raw()));
        ret
    }

    /// Deserialize a list from a stream of words
    pub fn decode(data: &[u32]) -> Result<FlatList, String> {
        let mut it = data.iter().copied();
        let mut next = |what: &str| -> Result<u32, String> {
            it.next()
                .ok_or_else(|| format!("Unexpected end of stream while reading {what}"))
        };
        let nb_inputs = next("the header")? as usize;
        let nb_instructions = next("the header")? as usize;
        let nb_outputs = next("the header")? as usize;
        let mut ret = FlatList::new(nb_inputs);
        for i in 0..nb_instructions {
            let code = next("an opcode")?;
            let opcode = Opcode::from_code(code)
                .ok_or_else(|| format!("Unknown opcode {code} in instruction {i}"))?;
            let mut fanins = [Signal::zero(); 3];
            for f in fanins.iter_mut().take(opcode.arity()) {
                *f = Signal::from_raw(next("a fanin")?);
                if f.index() >= ret.nb_literals() {
                    return Err(format!("Undefined literal {f} in instruction {i}"));
                }
            }
            ret.instructions.push(Instruction { opcode, fanins });
        }
        for i in 0..nb_outputs {
            let s = Signal::from_raw(next("an output")?);
            if s.index() >= ret.nb_literals() {
                return Err(format!("Undefined literal {s} in output {i}"));
            }
            ret.outputs.push(s);
        }
        if next("trailing data").is_ok() {
            return Err("Trailing data after the outputs".to_string());
        }
        Ok(ret)
    }

    /// Rebuild the instructions in a network, from the given input signals; return the outputs
    pub fn replay(&self, ntk: &mut Network, inputs: &[Signal]) -> Vec<Signal> {
        assert_eq!(inputs.len(), self.nb_inputs, "Wrong number of inputs");
        let mut translation = Vec::with_capacity(self.nb_literals());
        translation.push(Signal::zero());
        translation.extend_from_slice(inputs);
        for inst in self.instructions.iter() {
            let s = ntk.add(inst.gate().remap_order(&translation));
            translation.push(s);
        }
        self.outputs.iter().map(|s| s.remap(&translation)).collect()
    }

    /// Compute the value of every output
    pub fn simulate<V: SimulationValue>(&self, inputs: &[V]) -> Vec<V> {
        assert_eq!(inputs.len(), self.nb_inputs, "Wrong number of inputs");
        let mut values = Vec::with_capacity(self.nb_literals());
        values.push(V::default());
        values.extend_from_slice(inputs);
        for inst in self.instructions.iter() {
            let fanin_values: Vec<V> = inst.fanins().iter().map(|s| values[s.index()]).collect();
            let v = inst.gate().compute(&fanin_values);
            values.push(v);
        }
        self.outputs
            .iter()
            .map(|s| signal_value(&values, *s))
            .collect()
    }
}

impl fmt::Display for FlatList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Flat list with {} inputs, {} outputs:",
            self.nb_inputs,
            self.nb_outputs()
        )?;
        for (i, inst) in self.instructions.iter().enumerate() {
            writeln!(f, "\tx{} = {}", 1 + self.nb_inputs + i, inst.gate())?;
        }
        for (i, o) in self.outputs.iter().enumerate() {
            writeln!(f, "\to{i} = {o}")?;
        }
        Ok(())
    }
}
