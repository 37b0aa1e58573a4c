use crate::engine::{sigmoid, MutableScalarTensor, ScalarTensor};
use rand::{distributions::Uniform, Rng};

pub trait Module {
    fn zero_grad(&mut self);
    fn parameters(&self) -> Vec<MutableScalarTensor>;
    fn forward(&self, x: &[MutableScalarTensor]) -> Vec<MutableScalarTensor>;
}

pub struct LinearNeuron {
    weights: Vec<MutableScalarTensor>,
    bias: MutableScalarTensor,
}

impl LinearNeuron {
    /// Draws weights and bias from `U(-1/sqrt(n), 1/sqrt(n))`, weights first.
    pub fn new<R: Rng>(num_weights: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (num_weights.max(1) as f32).sqrt();
        let uniform = Uniform::new(-bound, bound);
        let weights = (0..num_weights)
            .map(|_| ScalarTensor::new(rng.sample(uniform)))
            .collect();

        let bias = ScalarTensor::new(rng.sample(uniform));
        Self { weights, bias }
    }

    pub fn from_parameters(weights: &[f32], bias: f32) -> Self {
        Self {
            weights: weights.iter().map(|w| ScalarTensor::new(*w)).collect(),
            bias: ScalarTensor::new(bias),
        }
    }

    pub fn weights(&self) -> &[MutableScalarTensor] {
        &self.weights
    }

    pub fn bias(&self) -> &MutableScalarTensor {
        &self.bias
    }
}

impl Module for LinearNeuron {
    fn zero_grad(&mut self) {
        for w in self.weights.iter() {
            w.borrow_mut().zero_grad();
        }
        self.bias.borrow_mut().zero_grad();
    }

    fn parameters(&self) -> Vec<MutableScalarTensor> {
        let mut params = self.weights.clone();
        params.push(self.bias.clone());
        params
    }

    fn forward(&self, x: &[MutableScalarTensor]) -> Vec<MutableScalarTensor> {
        if self.weights.len() != x.len() {
            panic!("Weights and input lengths must match");
        }

        // w * x + b, starting from the bias to avoid an extra zero node
        let mut result = self.bias.clone();
        for (w_i, x_i) in self.weights.iter().zip(x.iter()) {
            result = result + w_i * x_i;
        }
        vec![result]
    }
}

/// One input, one output: `sigmoid(weight * x + bias)`.
pub struct LogisticRegression {
    neuron: LinearNeuron,
}

impl LogisticRegression {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            neuron: LinearNeuron::new(1, rng),
        }
    }

    pub fn from_parameters(slope: f32, intercept: f32) -> Self {
        Self {
            neuron: LinearNeuron::from_parameters(&[slope], intercept),
        }
    }

    pub fn slope(&self) -> f32 {
        self.neuron.weights()[0].data()
    }

    pub fn intercept(&self) -> f32 {
        self.neuron.bias().data()
    }

    /// Builds one graph per sample and returns the predicted probabilities.
    pub fn predict_batch(&self, xs: &[f32]) -> Vec<MutableScalarTensor> {
        xs.iter()
            .flat_map(|x| self.forward(&[ScalarTensor::new(*x)]))
            .collect()
    }

    pub fn fitted(&self) -> FittedCurve {
        FittedCurve {
            slope: self.slope(),
            intercept: self.intercept(),
        }
    }
}

impl Module for LogisticRegression {
    fn zero_grad(&mut self) {
        self.neuron.zero_grad();
    }

    fn parameters(&self) -> Vec<MutableScalarTensor> {
        self.neuron.parameters()
    }

    fn forward(&self, x: &[MutableScalarTensor]) -> Vec<MutableScalarTensor> {
        self.neuron
            .forward(x)
            .iter()
            .map(|z| z.sigmoid())
            .collect()
    }
}

/// Plain-float snapshot of a trained model, detached from the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedCurve {
    pub slope: f32,
    pub intercept: f32,
}

impl FittedCurve {
    pub fn logit(&self, x: f32) -> f32 {
        self.slope * x + self.intercept
    }

    pub fn predict(&self, x: f32) -> f32 {
        sigmoid(self.logit(x))
    }

    /// The x where the predicted probability crosses 0.5, if the curve isn't flat.
    pub fn decision_boundary(&self) -> Option<f32> {
        if self.slope == 0.0 {
            None
        } else {
            Some(-self.intercept / self.slope)
        }
    }

    pub fn classify(&self, x: f32) -> bool {
        self.predict(x) > 0.5
    }
}
