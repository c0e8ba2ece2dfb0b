use kanban::Project;

pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub selected_index: usize,
}

impl ProjectsState {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            selected_index: 0,
        }
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.selected_index = self.selected_index.min(self.projects.len().saturating_sub(1));
    }

    pub fn selected(&self) -> Option<&Project> {
        self.projects.get(self.selected_index)
    }

    pub fn name_of(&self, project_id: &str) -> Option<&str> {
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.name.as_str())
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.projects.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }
}

impl Default for ProjectsState {
    fn default() -> Self {
        Self::new()
    }
}
