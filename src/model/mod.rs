pub mod accounting;
pub mod compensation;
pub mod employee;
pub mod expense;
pub mod money;
pub mod payroll;
pub mod role;
