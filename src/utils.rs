use ndarray::{ArrayBase, Data, DataMut, Dimension};

/// A trait to replace all elements in a container with zeros.
pub trait ZeroOut {
    fn zero_out(&mut self);
}

impl<S, D> ZeroOut for ArrayBase<S, D>
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    fn zero_out(&mut self) {
        self.fill(0.0);
    }
}

/// A trait for containers that can report whether every element is finite.
pub trait AllFinite {
    fn all_finite(&self) -> bool;
}

impl<S, D> AllFinite for ArrayBase<S, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }
}
