use std::{
    cell::{Ref, RefCell, RefMut},
    collections::HashSet,
    ops::{Add, Div, Mul, Neg, Sub},
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

pub type ScalarTensorUniqueID = usize;

/// Lower bound applied to the output of `ln`, so `ln(0)` stays finite.
pub const LOG_FLOOR: f32 = -100.0;

static NEXT_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);

/// Logistic function, split by sign so large magnitudes don't overflow `exp`.
pub fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    NONE,
    ADD,
    MUL,
    POW(f32),
    EXP,
    LN,
    SIGMOID,
}

///
/// Scalar tensor is a single value object that stores it's
/// data and it's gradient.
/// In order for backpropogation to work correctly we also need to store
/// the building blocks of this tensor - the so called children, together
/// with the operation that combined them.
#[derive(Debug)]
pub struct ScalarTensor {
    pub data: f32,
    pub grad: f32,
    pub unique_id: ScalarTensorUniqueID,
    children: Vec<MutableScalarTensor>,
    op: Op,
}

/// Shared, mutable handle to a node of the computation graph.
///
/// Cloning the handle clones the pointer, not the node, so a parameter can be
/// referenced by every graph built from it while the optimizer updates it in place.
#[derive(Debug, Clone)]
pub struct MutableScalarTensor(Rc<RefCell<ScalarTensor>>);

impl ScalarTensor {
    /// Creates a new leaf tensor.
    pub fn new(data: f32) -> MutableScalarTensor {
        Self::with_op(data, vec![], Op::NONE)
    }

    /// One addition node over every term, so long sums stay one level deep.
    pub fn sum(terms: &[MutableScalarTensor]) -> MutableScalarTensor {
        let data: f32 = terms.iter().map(|t| t.data()).sum();
        Self::with_op(data, terms.to_vec(), Op::ADD)
    }

    fn with_op(data: f32, children: Vec<MutableScalarTensor>, op: Op) -> MutableScalarTensor {
        MutableScalarTensor(Rc::new(RefCell::new(Self {
            data,
            grad: 0.0,
            unique_id: NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed),
            children,
            op,
        })))
    }

    pub fn zero_grad(&mut self) {
        self.grad = 0.0;
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl MutableScalarTensor {
    pub fn borrow(&self) -> Ref<'_, ScalarTensor> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ScalarTensor> {
        self.0.borrow_mut()
    }

    pub fn data(&self) -> f32 {
        self.borrow().data
    }

    pub fn grad(&self) -> f32 {
        self.borrow().grad
    }

    pub fn pow(&self, exponent: f32) -> MutableScalarTensor {
        let data = self.data().powf(exponent);
        ScalarTensor::with_op(data, vec![self.clone()], Op::POW(exponent))
    }

    pub fn exp(&self) -> MutableScalarTensor {
        let data = self.data().exp();
        ScalarTensor::with_op(data, vec![self.clone()], Op::EXP)
    }

    /// Natural log, clamped from below at `LOG_FLOOR`.
    pub fn ln(&self) -> MutableScalarTensor {
        let data = self.data().ln().max(LOG_FLOOR);
        ScalarTensor::with_op(data, vec![self.clone()], Op::LN)
    }

    pub fn sigmoid(&self) -> MutableScalarTensor {
        let data = sigmoid(self.data());
        ScalarTensor::with_op(data, vec![self.clone()], Op::SIGMOID)
    }

    /// Back-propagates from this tensor, accumulating into every reachable `grad`.
    pub fn backward(&self) {
        let topo = self.build_reversed_topo();
        self.borrow_mut().grad = 1.0;
        for tensor in topo {
            tensor.grad_fn();
        }
    }

    // Post-order walk with an explicit stack; the flag marks nodes whose children are queued
    fn build_reversed_topo(&self) -> Vec<Self> {
        let mut visited = HashSet::new();
        let mut topo = Vec::new();
        let mut stack = vec![(self.clone(), false)];

        while let Some((tensor, expanded)) = stack.pop() {
            if expanded {
                topo.push(tensor);
                continue;
            }

            let children = {
                let current = tensor.borrow();
                if !visited.insert(current.unique_id) {
                    continue;
                }
                current.children.clone()
            };
            stack.push((tensor, true));
            for child in children.into_iter().rev() {
                stack.push((child, false));
            }
        }

        topo.reverse();
        topo
    }

    // Apply the chain rule: local derivative times the gradient flowing into this node
    fn grad_fn(&self) {
        let (op, data, grad, children) = {
            let current = self.borrow();
            (current.op, current.data, current.grad, current.children.clone())
        };

        match op {
            Op::NONE => (),
            Op::ADD => {
                for child in children.iter() {
                    child.borrow_mut().grad += grad;
                }
            }
            Op::MUL => {
                let lhs = children[0].data();
                let rhs = children[1].data();
                children[0].borrow_mut().grad += rhs * grad;
                children[1].borrow_mut().grad += lhs * grad;
            }
            Op::POW(exponent) => {
                let x = children[0].data();
                children[0].borrow_mut().grad += exponent * x.powf(exponent - 1.0) * grad;
            }
            Op::EXP => children[0].borrow_mut().grad += data * grad,
            Op::LN => {
                let x = children[0].data();
                // Clamped outputs are constant
                if x.ln() > LOG_FLOOR {
                    children[0].borrow_mut().grad += grad / x;
                }
            }
            Op::SIGMOID => children[0].borrow_mut().grad += data * (1.0 - data) * grad,
        }
    }
}

fn add_tensors(lhs: &MutableScalarTensor, rhs: &MutableScalarTensor) -> MutableScalarTensor {
    let data = lhs.data() + rhs.data();
    ScalarTensor::with_op(data, vec![lhs.clone(), rhs.clone()], Op::ADD)
}

fn mul_tensors(lhs: &MutableScalarTensor, rhs: &MutableScalarTensor) -> MutableScalarTensor {
    let data = lhs.data() * rhs.data();
    ScalarTensor::with_op(data, vec![lhs.clone(), rhs.clone()], Op::MUL)
}

fn sub_tensors(lhs: &MutableScalarTensor, rhs: &MutableScalarTensor) -> MutableScalarTensor {
    add_tensors(lhs, &mul_tensors(rhs, &ScalarTensor::new(-1.0)))
}

fn div_tensors(lhs: &MutableScalarTensor, rhs: &MutableScalarTensor) -> MutableScalarTensor {
    mul_tensors(lhs, &rhs.pow(-1.0))
}

// Every combination of owned/borrowed tensor and plain f32 operands
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<&MutableScalarTensor> for &MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: &MutableScalarTensor) -> MutableScalarTensor {
                $func(self, rhs)
            }
        }

        impl $trait<MutableScalarTensor> for &MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: MutableScalarTensor) -> MutableScalarTensor {
                $func(self, &rhs)
            }
        }

        impl $trait<&MutableScalarTensor> for MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: &MutableScalarTensor) -> MutableScalarTensor {
                $func(&self, rhs)
            }
        }

        impl $trait<MutableScalarTensor> for MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: MutableScalarTensor) -> MutableScalarTensor {
                $func(&self, &rhs)
            }
        }

        impl $trait<f32> for &MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: f32) -> MutableScalarTensor {
                $func(self, &ScalarTensor::new(rhs))
            }
        }

        impl $trait<f32> for MutableScalarTensor {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: f32) -> MutableScalarTensor {
                $func(&self, &ScalarTensor::new(rhs))
            }
        }

        impl $trait<&MutableScalarTensor> for f32 {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: &MutableScalarTensor) -> MutableScalarTensor {
                $func(&ScalarTensor::new(self), rhs)
            }
        }

        impl $trait<MutableScalarTensor> for f32 {
            type Output = MutableScalarTensor;
            fn $method(self, rhs: MutableScalarTensor) -> MutableScalarTensor {
                $func(&ScalarTensor::new(self), &rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add_tensors);
impl_binary_op!(Sub, sub, sub_tensors);
impl_binary_op!(Mul, mul, mul_tensors);
impl_binary_op!(Div, div, div_tensors);

impl Neg for &MutableScalarTensor {
    type Output = MutableScalarTensor;
    fn neg(self) -> MutableScalarTensor {
        self * -1.0
    }
}

impl Neg for MutableScalarTensor {
    type Output = MutableScalarTensor;
    fn neg(self) -> MutableScalarTensor {
        &self * -1.0
    }
}
