// VM Stack: fixed-capacity i32 stack shared by operands and call frames

use super::error::StackError;

/// Fixed-size stack for VM operations
#[derive(Debug, Clone)]
pub struct Stack {
    data: Vec<i32>,
    max_size: usize,
}

impl Stack {
    /// Creates a new stack with the specified maximum size
    pub fn with_size(max_size: usize) -> Self {
        Stack {
            data: Vec::new(),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Pushes a value onto the stack
    pub fn push(&mut self, value: i32) -> Result<(), StackError> {
        if self.data.len() >= self.max_size {
            return Err(StackError::Overflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pops a value from the stack
    pub fn pop(&mut self) -> Result<i32, StackError> {
        self.data.pop().ok_or(StackError::Underflow)
    }

    pub fn peek(&self) -> Result<i32, StackError> {
        self.data.last().copied().ok_or(StackError::Underflow)
    }

    /// Duplicates the top value on the stack
    pub fn dup(&mut self) -> Result<(), StackError> {
        let value = self.peek()?;
        self.push(value)
    }

    /// Replaces the top value with `f(top)`
    pub fn map_top(&mut self, f: impl FnOnce(i32) -> i32) -> Result<(), StackError> {
        let top = self.data.last_mut().ok_or(StackError::Underflow)?;
        *top = f(*top);
        Ok(())
    }

    /// Reads an absolute slot (0 is the bottom)
    pub fn get(&self, index: usize) -> Result<i32, StackError> {
        self.data.get(index).copied().ok_or(StackError::Underflow)
    }

    /// Drops everything above `len`
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns a slice representing the current stack data (top is last element)
    pub fn view(&self) -> &[i32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_push_pop() {
        let mut stack = Stack::with_size(32);
        assert!(stack.push(1).is_ok());
        assert!(stack.push(2).is_ok());
        assert_eq!(stack.pop().unwrap(), 2);
        assert_eq!(stack.pop().unwrap(), 1);
        assert_eq!(stack.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn test_stack_overflow() {
        let mut stack = Stack::with_size(2);
        assert!(stack.push(1).is_ok());
        assert!(stack.push(2).is_ok());
        assert_eq!(stack.push(3), Err(StackError::Overflow));
        assert_eq!(stack.dup(), Err(StackError::Overflow));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_stack_dup_map_top() {
        let mut stack = Stack::with_size(4);
        assert_eq!(stack.dup(), Err(StackError::Underflow));
        stack.push(3).unwrap();
        stack.dup().unwrap();
        stack.map_top(|v| v + 1).unwrap();
        assert_eq!(stack.view(), &[3, 4]);
    }

    #[test]
    fn test_stack_get_truncate() {
        let mut stack = Stack::with_size(8);
        for v in 10..15 {
            stack.push(v).unwrap();
        }
        assert_eq!(stack.get(1).unwrap(), 11);
        assert!(stack.get(5).is_err());
        stack.truncate(2);
        assert_eq!(stack.view(), &[10, 11]);
    }
}
