#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Up,
    Down,
    Left,
    Right,

    // Selection
    Select,
    Back,
    Quit,

    // Task operations
    CreateTask,
    DeleteTask,
    Confirm,

    // Drag and drop
    PickUp,
    Drop,
    CancelDrag,

    // Stepper controls
    StepForward,
    StepBackward,

    // Help
    ShowHelp,

    // Resync from the store
    Refresh,
}
